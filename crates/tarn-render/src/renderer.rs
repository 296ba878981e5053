//! Frame renderer: owns every GPU resource of the scene and records the
//! shadow and main passes each frame

use crate::boot::{BootSequence, BootStage};
use crate::camera::FirstPersonCamera;
use crate::context::RenderContext;
use crate::gpu_mesh::{GpuChunkGrid, GpuMesh};
use crate::material::Material;
use crate::outline::LandOutlinePass;
use crate::pipeline::{light_direction, FrameUniforms, Layouts, ModelBinding, Program, ProgramKind};
use crate::shadow::ShadowPass;
use crate::texture_cache::{TextureCache, TextureKind, TextureSet, TextureSlot};
use glam::{Mat4, Vec3};
use std::path::PathBuf;
use tarn_core::{Readiness, RenderSettings, TarnConfig, TarnError};
use tarn_terrain::{MarkerCube, Scene};

/// Clear colour of the main pass
pub const SKY_COLOR: wgpu::Color = wgpu::Color {
    r: 0.53,
    g: 0.74,
    b: 0.92,
    a: 1.0,
};

/// Advance of the time uniform and marker spin per update
pub const TIME_STEP: f32 = 0.01;

/// Texture names, keyed into the `TextureCache`
const TERRAIN_TEX: &str = "terrain";
const TERRAIN_NORMAL: &str = "terrain_normal";
const WATER_TEX: &str = "water";
const TREE_TEX: &str = "tree";
const FLAT_NORMAL: &str = "flat_normal";
/// The built-in white texture; never requested from disk
const WHITE: &str = "";

/// Diffuse and normal-map slot numbers
const DIFFUSE: u32 = TextureSlot::Diffuse as u32;
const NORMAL_MAP: u32 = TextureSlot::NormalMap as u32;

/// `(slot, texture)` bindings per material
const TERRAIN_SLOTS: [(u32, &str); 2] = [(DIFFUSE, TERRAIN_TEX), (NORMAL_MAP, TERRAIN_NORMAL)];
const TREE_SLOTS: [(u32, &str); 2] = [(DIFFUSE, TREE_TEX), (NORMAL_MAP, FLAT_NORMAL)];
const WATER_SLOTS: [(u32, &str); 2] = [(DIFFUSE, WATER_TEX), (NORMAL_MAP, FLAT_NORMAL)];
const MARKER_SLOTS: [(u32, &str); 2] = [(DIFFUSE, WHITE), (NORMAL_MAP, FLAT_NORMAL)];

struct Materials {
    terrain: Material,
    tree: Material,
    water: Material,
    marker: Material,
}

impl Materials {
    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        [
            &mut self.terrain,
            &mut self.tree,
            &mut self.water,
            &mut self.marker,
        ]
        .into_iter()
    }
}

struct Drawable {
    mesh: GpuMesh,
    model: ModelBinding,
}

/// Marker cube and its spin
struct Marker {
    cube: MarkerCube,
    drawable: Drawable,
    angle: f32,
}

pub struct TarnRenderer {
    layouts: Layouts,
    shadow: ShadowPass,
    outline: LandOutlinePass,
    terrain_program: Readiness<Program>,
    props_program: Readiness<Program>,
    water_program: Readiness<Program>,
    textures: TextureCache,
    texture_paths: RenderSettings,
    materials: Materials,

    terrain: GpuChunkGrid,
    water: Option<GpuChunkGrid>,
    trees: Vec<Drawable>,
    marker: Marker,
    /// Identity model transform shared by terrain and water chunks
    identity: ModelBinding,

    boot: BootSequence,
    light_pos: Vec3,
    time: f32,
}

impl TarnRenderer {
    /// Upload the scene geometry and create the depth targets.
    /// Programs and textures stay pending until [`TarnRenderer::boot`].
    pub fn new(context: &RenderContext, scene: &Scene, config: &TarnConfig) -> Self {
        let device = &context.device;
        let layouts = Layouts::new(device);

        let shadow = ShadowPass::new(device, config.render.shadow_resolution);
        let outline = LandOutlinePass::new(device, config.render.outline_resolution);

        let mut textures = TextureCache::new(device, &context.queue);
        for (name, kind) in [
            (TERRAIN_TEX, TextureKind::Color),
            (TERRAIN_NORMAL, TextureKind::Normal),
            (WATER_TEX, TextureKind::Color),
            (TREE_TEX, TextureKind::Color),
            (FLAT_NORMAL, TextureKind::Normal),
        ] {
            textures.request(name, kind);
        }

        let material = |name: &str, slots: &[(u32, &str)]| {
            let set = TextureSet::from_slots(slots);
            Material::new(device, &layouts, name, set, &textures, &shadow, &outline)
        };
        let materials = Materials {
            terrain: material("Terrain", &TERRAIN_SLOTS),
            tree: material("Tree", &TREE_SLOTS),
            water: material("Water", &WATER_SLOTS),
            marker: material("Marker", &MARKER_SLOTS),
        };

        let terrain = GpuChunkGrid::upload(device, "Terrain", scene.floor.grid());
        let water = scene
            .water
            .as_ref()
            .map(|water| GpuChunkGrid::upload(device, "Water", water.grid()));

        let trees = scene
            .trees
            .iter()
            .zip(scene.tree_transforms())
            .enumerate()
            .map(|(i, (tree, transform))| {
                let label = format!("Tree {}", i);
                Drawable {
                    mesh: GpuMesh::upload(device, &label, &tree.mesh),
                    model: ModelBinding::new(device, &layouts, &label, transform),
                }
            })
            .collect();

        let marker = Marker {
            cube: scene.marker.clone(),
            drawable: Drawable {
                mesh: GpuMesh::upload(device, "Marker", &scene.marker.mesh),
                model: ModelBinding::new(device, &layouts, "Marker", scene.marker.transform(0.0)),
            },
            angle: 0.0,
        };

        let identity = ModelBinding::new(device, &layouts, "Identity", Mat4::IDENTITY);

        log::info!(
            "Renderer created: {} trees, water {}",
            scene.trees.len(),
            if water.is_some() { "on" } else { "off" }
        );

        let mut renderer = Self {
            layouts,
            shadow,
            outline,
            terrain_program: Readiness::Pending,
            props_program: Readiness::Pending,
            water_program: Readiness::Pending,
            textures,
            texture_paths: config.render.clone(),
            materials,
            terrain,
            water,
            trees,
            marker,
            identity,
            boot: BootSequence::new(),
            light_pos: Vec3::ZERO,
            time: 0.0,
        };
        renderer.set_light(
            Vec3::from(config.light.position),
            Vec3::from(config.light.target),
        );
        renderer
    }

    /// Run the boot stages to completion
    pub fn boot(&mut self, context: &RenderContext) {
        let mut boot = std::mem::take(&mut self.boot);
        boot.run(|stage| self.run_stage(context, stage));
        self.boot = boot;
    }

    fn run_stage(&mut self, context: &RenderContext, stage: BootStage) -> tarn_core::Result<()> {
        match stage {
            BootStage::LoadingShaders => self.compile_programs(context),
            BootStage::LoadingAssets => self.load_textures(context),
            BootStage::OutliningLand => self.outline.render(
                &context.device,
                &context.queue,
                &self.terrain,
                &self.identity.bind_group,
            ),
            BootStage::Ready => Ok(()),
        }
    }

    fn compile_programs(&mut self, context: &RenderContext) -> tarn_core::Result<()> {
        let device = &context.device;
        let format = context.config.format;

        self.shadow.compile(device, &self.layouts);
        self.outline.compile(device, &self.layouts);
        self.terrain_program = Program::compile(device, format, &self.layouts, ProgramKind::Terrain);
        self.props_program = Program::compile(device, format, &self.layouts, ProgramKind::Props);
        self.water_program = Program::compile(device, format, &self.layouts, ProgramKind::Water);

        let failed: Vec<&str> = [
            ("shadow", self.shadow.program.is_failed()),
            ("land outline", self.outline.program.is_failed()),
            ("terrain", self.terrain_program.is_failed()),
            ("props", self.props_program.is_failed()),
            ("water", self.water_program.is_failed()),
        ]
        .into_iter()
        .filter_map(|(name, failed)| failed.then_some(name))
        .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(TarnError::RenderError(format!(
                "programs disabled: {}",
                failed.join(", ")
            )))
        }
    }

    fn load_textures(&mut self, context: &RenderContext) -> tarn_core::Result<()> {
        let paths = &self.texture_paths;
        let files = [
            (TERRAIN_TEX, &paths.terrain_texture, TextureKind::Color),
            (TERRAIN_NORMAL, &paths.terrain_normal_map, TextureKind::Normal),
            (WATER_TEX, &paths.water_texture, TextureKind::Color),
            (TREE_TEX, &paths.tree_texture, TextureKind::Color),
            (FLAT_NORMAL, &paths.flat_normal_map, TextureKind::Normal),
        ];
        let mut missing = Vec::new();
        for (name, path, kind) in files {
            let path = PathBuf::from(path);
            self.textures
                .load_file(&context.device, &context.queue, name, &path, kind);
            if !self.textures.is_ready(name) {
                missing.push(name);
            }
        }

        for material in self.materials.iter_mut() {
            material.rebind(
                &context.device,
                &self.layouts,
                &self.textures,
                &self.shadow,
                &self.outline,
            );
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TarnError::TextureError(format!(
                "using defaults for: {}",
                missing.join(", ")
            )))
        }
    }

    /// Move the light; the shadow light space follows immediately
    pub fn set_light(&mut self, position: Vec3, target: Vec3) {
        self.light_pos = position;
        self.shadow.set_light(position, target);
    }

    /// Water draws once its program compiled and the land outline exists
    pub fn water_ready(&self) -> bool {
        self.water.is_some() && self.water_program.is_ready() && self.outline.is_rendered()
    }

    /// Fixed-step animation: water time and marker spin
    pub fn update(&mut self) {
        self.time += TIME_STEP;
        self.marker.angle += TIME_STEP;
    }

    fn frame_uniforms(&self, camera: &FirstPersonCamera) -> FrameUniforms {
        FrameUniforms {
            view: camera.view_matrix().to_cols_array_2d(),
            projection: camera.projection_matrix().to_cols_array_2d(),
            light_space: self.shadow.light_space().to_cols_array_2d(),
            land_space: self.outline.land_space().to_cols_array_2d(),
            light_dir: light_direction(self.light_pos).to_array(),
            time: self.time,
            camera_pos: camera.position.to_array(),
            _pad: 0.0,
        }
    }

    /// Record and submit one frame into `view`
    pub fn render(&self, context: &RenderContext, camera: &FirstPersonCamera, view: &wgpu::TextureView) {
        let queue = &context.queue;

        // Every program gets its uniforms rewritten each frame
        let frame = self.frame_uniforms(camera);
        for program in [&self.terrain_program, &self.props_program, &self.water_program] {
            if let Some(program) = program.get() {
                program.write_frame(queue, &frame);
            }
        }
        self.marker
            .drawable
            .model
            .write(queue, self.marker.cube.transform(self.marker.angle));

        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let (cam_x, cam_z) = (camera.position.x, camera.position.z);

        let marker = &self.marker.drawable;
        let casters = std::iter::once((&marker.mesh, &marker.model.bind_group))
            .chain(
                self.terrain
                    .visible(cam_x, cam_z)
                    .map(|mesh| (mesh, &self.identity.bind_group)),
            )
            .chain(self.trees.iter().map(|t| (&t.mesh, &t.model.bind_group)));
        self.shadow.record(queue, &mut encoder, casters);

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(SKY_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &context.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(program) = self.terrain_program.get() {
                pass.set_pipeline(&program.pipeline);
                pass.set_bind_group(0, &program.frame_bind_group, &[]);

                pass.set_bind_group(1, &marker.model.bind_group, &[]);
                pass.set_bind_group(2, &self.materials.marker.bind_group, &[]);
                marker.mesh.draw(&mut pass);

                pass.set_bind_group(1, &self.identity.bind_group, &[]);
                pass.set_bind_group(2, &self.materials.terrain.bind_group, &[]);
                for mesh in self.terrain.visible(cam_x, cam_z) {
                    mesh.draw(&mut pass);
                }
            }

            if let Some(program) = self.props_program.get() {
                pass.set_pipeline(&program.pipeline);
                pass.set_bind_group(0, &program.frame_bind_group, &[]);
                pass.set_bind_group(2, &self.materials.tree.bind_group, &[]);
                for tree in &self.trees {
                    pass.set_bind_group(1, &tree.model.bind_group, &[]);
                    tree.mesh.draw(&mut pass);
                }
            }

            if self.water_ready() {
                if let (Some(program), Some(water)) = (self.water_program.get(), &self.water) {
                    pass.set_pipeline(&program.pipeline);
                    pass.set_bind_group(0, &program.frame_bind_group, &[]);
                    pass.set_bind_group(1, &self.identity.bind_group, &[]);
                    pass.set_bind_group(2, &self.materials.water.bind_group, &[]);
                    for mesh in water.visible(cam_x, cam_z) {
                        mesh.draw(&mut pass);
                    }
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}
