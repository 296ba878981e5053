//! Uniform layouts and render pipelines for each shader program

use crate::context::DEPTH_FORMAT;
use crate::gpu_mesh::MeshVertex;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use tarn_core::{Readiness, TarnError};
use wgpu::util::DeviceExt;

/// Depth test shared by every pipeline
pub const DEPTH_COMPARE: wgpu::CompareFunction = wgpu::CompareFunction::LessEqual;

/// Per-program frame data (bind group 0), rewritten every frame
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// Shadow light space
    pub light_space: [[f32; 4]; 4],
    /// Top-down land outline space
    pub land_space: [[f32; 4]; 4],
    pub light_dir: [f32; 3],
    pub time: f32,
    pub camera_pos: [f32; 3],
    pub _pad: f32,
}

impl Default for FrameUniforms {
    fn default() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self {
            view: identity,
            projection: identity,
            light_space: identity,
            land_space: identity,
            light_dir: [0.0, -1.0, 0.0],
            time: 0.0,
            camera_pos: [0.0; 3],
            _pad: 0.0,
        }
    }
}

/// Frame data for the depth-only programs
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightSpaceUniforms {
    pub light_space: [[f32; 4]; 4],
}

impl LightSpaceUniforms {
    pub fn new(light_space: Mat4) -> Self {
        Self {
            light_space: light_space.to_cols_array_2d(),
        }
    }
}

/// Per-draw transform (bind group 1)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
}

impl ModelUniforms {
    pub fn new(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
        }
    }
}

/// A model transform with its own uniform buffer and bind group
pub struct ModelBinding {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl ModelBinding {
    pub fn new(device: &wgpu::Device, layouts: &Layouts, label: &str, model: Mat4) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Model Buffer", label)),
            contents: bytemuck::cast_slice(&[ModelUniforms::new(model)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Model Bind Group", label)),
            layout: &layouts.model,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    pub fn write(&self, queue: &wgpu::Queue, model: Mat4) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[ModelUniforms::new(model)]));
    }
}

/// Light direction uniform: pointing from the light toward the scene
pub fn light_direction(light_pos: Vec3) -> Vec3 {
    (-light_pos).normalize_or(Vec3::NEG_Y)
}

/// Bind group layouts shared by every program
pub struct Layouts {
    /// Group 0 of the colour programs
    pub frame: wgpu::BindGroupLayout,
    /// Group 0 of the depth-only programs
    pub light_space: wgpu::BindGroupLayout,
    /// Group 1 of every program
    pub model: wgpu::BindGroupLayout,
    /// Group 2 of the colour programs
    pub material: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });
        let light_space = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Light Space Bind Group Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });
        let model = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Bind Group Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[
                // binding 0: shadow map
                depth_texture_entry(0),
                // binding 1: shadow comparison sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
                // binding 2/3: diffuse
                texture_entry(2),
                sampler_entry(3),
                // binding 4: land outline depth, read with textureLoad
                depth_texture_entry(4),
                // binding 5/6: normal map
                texture_entry(5),
                sampler_entry(6),
            ],
        });

        Self {
            frame,
            light_space,
            model,
            material,
        }
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn depth_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Depth,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

/// Run a pipeline build inside a validation error scope.
/// WGSL compile errors and pipeline validation errors land in the scope
/// instead of the device's uncaptured-error handler.
pub fn validated<T>(device: &wgpu::Device, program: &str, build: impl FnOnce() -> T) -> Readiness<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    match pollster::block_on(device.pop_error_scope()) {
        None => {
            log::info!("Program '{}' ready", program);
            Readiness::Ready(value)
        }
        Some(error) => {
            let error = TarnError::ShaderError {
                program: program.to_string(),
                message: error.to_string(),
            };
            log::error!("{}", error);
            Readiness::Failed(error.to_string())
        }
    }
}

/// The colour programs drawn in the main pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramKind {
    /// Terrain chunks and the marker cube, normal mapped
    Terrain,
    /// Trees
    Props,
    /// Animated water surface
    Water,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 3] = [ProgramKind::Terrain, ProgramKind::Props, ProgramKind::Water];

    pub fn name(self) -> &'static str {
        match self {
            ProgramKind::Terrain => "terrain",
            ProgramKind::Props => "props",
            ProgramKind::Water => "water",
        }
    }

    fn source(self) -> &'static str {
        match self {
            ProgramKind::Terrain => include_str!("terrain.wgsl"),
            ProgramKind::Props => include_str!("props.wgsl"),
            ProgramKind::Water => include_str!("water.wgsl"),
        }
    }
}

/// A colour program: pipeline plus its own frame uniform buffer
pub struct Program {
    pub kind: ProgramKind,
    pub pipeline: wgpu::RenderPipeline,
    pub frame_buffer: wgpu::Buffer,
    pub frame_bind_group: wgpu::BindGroup,
}

impl Program {
    pub fn compile(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        layouts: &Layouts,
        kind: ProgramKind,
    ) -> Readiness<Self> {
        validated(device, kind.name(), || {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{} Shader", kind.name())),
                source: wgpu::ShaderSource::Wgsl(kind.source().into()),
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{} Pipeline Layout", kind.name())),
                bind_group_layouts: &[&layouts.frame, &layouts.model, &layouts.material],
                push_constant_ranges: &[],
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("{} Render Pipeline", kind.name())),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[MeshVertex::desc()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: DEPTH_COMPARE,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

            let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Frame Buffer", kind.name())),
                contents: bytemuck::cast_slice(&[FrameUniforms::default()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{} Frame Bind Group", kind.name())),
                layout: &layouts.frame,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                }],
            });

            Self {
                kind,
                pipeline,
                frame_buffer,
                frame_bind_group,
            }
        })
    }

    pub fn write_frame(&self, queue: &wgpu::Queue, frame: &FrameUniforms) {
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::cast_slice(&[*frame]));
    }
}

/// Depth-only program rendering into a light-space depth map
pub struct DepthProgram {
    pub pipeline: wgpu::RenderPipeline,
    pub light_buffer: wgpu::Buffer,
    pub light_bind_group: wgpu::BindGroup,
}

impl DepthProgram {
    /// `bias` is non-zero for shadow maps that are compared against later
    pub fn compile(
        device: &wgpu::Device,
        layouts: &Layouts,
        name: &str,
        bias: wgpu::DepthBiasState,
    ) -> Readiness<Self> {
        validated(device, name, || {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{} Shader", name)),
                source: wgpu::ShaderSource::Wgsl(include_str!("depth.wgsl").into()),
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{} Pipeline Layout", name)),
                bind_group_layouts: &[&layouts.light_space, &layouts.model],
                push_constant_ranges: &[],
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("{} Depth Pipeline", name)),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[MeshVertex::desc()],
                    compilation_options: Default::default(),
                },
                fragment: None, // Depth only, no fragment shader
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: DEPTH_COMPARE,
                    stencil: wgpu::StencilState::default(),
                    bias,
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

            let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Light Space Buffer", name)),
                contents: bytemuck::cast_slice(&[LightSpaceUniforms::new(Mat4::IDENTITY)]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{} Light Space Bind Group", name)),
                layout: &layouts.light_space,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: light_buffer.as_entire_binding(),
                }],
            });

            Self {
                pipeline,
                light_buffer,
                light_bind_group,
            }
        })
    }

    pub fn write_light_space(&self, queue: &wgpu::Queue, light_space: Mat4) {
        queue.write_buffer(
            &self.light_buffer,
            0,
            bytemuck::cast_slice(&[LightSpaceUniforms::new(light_space)]),
        );
    }
}

/// Depth target of a light-space pass: a square `Depth32Float` texture
/// that is both rendered to and sampled
pub struct DepthTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub resolution: u32,
}

impl DepthTarget {
    pub fn new(device: &wgpu::Device, label: &str, resolution: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            resolution,
        }
    }

    /// Begin a depth-only pass that clears to the far plane
    pub fn begin_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        label: &str,
    ) -> wgpu::RenderPass<'e> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_uniforms_match_wgsl_layout() {
        // 4 x mat4x4 + vec3/f32 + vec3/f32
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 288);
        assert_eq!(std::mem::size_of::<LightSpaceUniforms>(), 64);
        assert_eq!(std::mem::size_of::<ModelUniforms>(), 64);
    }

    #[test]
    fn light_direction_points_at_origin() {
        let dir = light_direction(Vec3::new(1.0, 5.0, 4.0));
        assert!((dir.length() - 1.0).abs() < 1e-6);
        assert!(dir.y < 0.0);
        assert_eq!(light_direction(Vec3::ZERO), Vec3::NEG_Y);
    }

    #[test]
    fn depth_test_accepts_equal_depth() {
        assert_eq!(DEPTH_COMPARE, wgpu::CompareFunction::LessEqual);
    }

    #[test]
    fn program_names_are_distinct() {
        let names: Vec<_> = ProgramKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, vec!["terrain", "props", "water"]);
    }
}
