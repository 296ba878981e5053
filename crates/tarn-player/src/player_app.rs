//! Viewer application implementing winit ApplicationHandler
//!
//! Boots the renderer when the window appears, then runs update and draw
//! once per redraw.

use crate::clock::FrameClock;
use crate::state::AppState;
use std::sync::Arc;
use tarn_core::TarnConfig;
use tarn_render::{RenderContext, TarnRenderer};
use tarn_terrain::Scene;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

pub struct PlayerApp {
    pub config: TarnConfig,
    pub scene: Scene,
    pub state: AppState,
    pub clock: FrameClock,

    window: Option<Arc<Window>>,
    render_context: Option<RenderContext>,
    renderer: Option<TarnRenderer>,

    pub fullscreen: bool,
    cursor_captured: bool,
}

impl PlayerApp {
    pub fn new(config: TarnConfig, scene: Scene, fullscreen: bool) -> Self {
        let state = AppState::new(&config.camera);
        Self {
            config,
            scene,
            state,
            clock: FrameClock::new(),
            window: None,
            render_context: None,
            renderer: None,
            fullscreen,
            cursor_captured: false,
        }
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) {
        let window_attrs = Window::default_attributes()
            .with_title("Tarn")
            .with_inner_size(PhysicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        if self.fullscreen {
            window.set_fullscreen(Some(winit::window::Fullscreen::Borderless(None)));
        }

        self.window = Some(window.clone());

        let render_context = match pollster::block_on(RenderContext::new(window)) {
            Ok(context) => context,
            Err(e) => {
                log::error!("Failed to initialise rendering: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.state.camera.aspect = render_context.aspect_ratio();

        let mut renderer = TarnRenderer::new(&render_context, &self.scene, &self.config);
        renderer.boot(&render_context);

        self.render_context = Some(render_context);
        self.renderer = Some(renderer);

        self.capture_cursor();
    }

    fn capture_cursor(&mut self) {
        if let Some(window) = &self.window {
            // Try confined first, then locked
            let _ = window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
            window.set_cursor_visible(false);
            self.cursor_captured = true;
        }
    }

    fn release_cursor(&mut self) {
        if let Some(window) = &self.window {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
            self.cursor_captured = false;
        }
    }

    fn tick(&mut self) {
        self.clock.tick();

        self.state.apply_look();
        let scene = &self.scene;
        self.state
            .update(self.clock.delta_time as f32, |x, z| scene.ground_height(x, z));

        let steps = self.clock.take_fixed_steps();
        if let Some(renderer) = &mut self.renderer {
            for _ in 0..steps {
                renderer.update();
            }
        }
    }

    fn render(&mut self, event_loop: &ActiveEventLoop) {
        let Some(context) = &mut self.render_context else {
            return;
        };
        let Some(renderer) = &self.renderer else {
            return;
        };

        let output = match context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                context.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout; skipping frame");
                return;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                event_loop.exit();
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        renderer.render(context, &self.state.camera, &view);

        output.present();
    }
}

impl ApplicationHandler for PlayerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            self.initialize(event_loop);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(context) = &mut self.render_context {
                    context.resize(new_size);
                    self.state.camera.aspect = context.aspect_ratio();
                }
            }

            WindowEvent::Focused(false) => {
                self.state.input.clear();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            // Escape releases the cursor, or exits if already released
                            if key_code == KeyCode::Escape {
                                if self.cursor_captured {
                                    self.release_cursor();
                                } else {
                                    event_loop.exit();
                                }
                                return;
                            }

                            if key_code == KeyCode::F11 {
                                if let Some(window) = &self.window {
                                    if window.fullscreen().is_some() {
                                        window.set_fullscreen(None);
                                    } else {
                                        window.set_fullscreen(Some(
                                            winit::window::Fullscreen::Borderless(None),
                                        ));
                                    }
                                }
                            }

                            self.state.input.process_key_down(key_code);
                        }
                        ElementState::Released => {
                            self.state.input.process_key_up(key_code);
                        }
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if !self.cursor_captured
                    && state == ElementState::Pressed
                    && button == MouseButton::Left
                {
                    self.capture_cursor();
                }
            }

            WindowEvent::RedrawRequested => {
                self.tick();
                self.render(event_loop);
            }

            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if !self.cursor_captured {
            return;
        }

        if let DeviceEvent::MouseMotion { delta } = event {
            self.state.input.process_mouse_raw_delta(delta.0, delta.1);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
