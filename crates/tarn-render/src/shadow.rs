//! Shadow mapping
//!
//! Renders the scene from the light's point of view into a single depth
//! texture. The colour programs compare against it with a `LessEqual`
//! comparison sampler.

use crate::gpu_mesh::GpuMesh;
use crate::pipeline::{DepthProgram, DepthTarget, Layouts};
use glam::{Mat4, Vec3};
use tarn_core::Readiness;

/// Half-extent of the shadow frustum
pub const SHADOW_EXTENT: f32 = 10.0;
pub const SHADOW_NEAR: f32 = 0.1;
pub const SHADOW_FAR: f32 = 40.0;

/// Orthographic projection times a look-at view from the light
pub fn shadow_light_space(light_pos: Vec3, target: Vec3) -> Mat4 {
    let proj = Mat4::orthographic_rh(
        -SHADOW_EXTENT,
        SHADOW_EXTENT,
        -SHADOW_EXTENT,
        SHADOW_EXTENT,
        SHADOW_NEAR,
        SHADOW_FAR,
    );
    proj * Mat4::look_at_rh(light_pos, target, Vec3::Y)
}

/// The shadow mapping system
pub struct ShadowPass {
    pub target: DepthTarget,
    pub sampler: wgpu::Sampler,
    pub program: Readiness<DepthProgram>,
    light_space: Mat4,
}

impl ShadowPass {
    pub fn new(device: &wgpu::Device, resolution: u32) -> Self {
        let target = DepthTarget::new(device, "Shadow Map", resolution);

        // Comparison sampler for hardware PCF
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Comparison Sampler"),
            compare: Some(wgpu::CompareFunction::LessEqual),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            target,
            sampler,
            program: Readiness::Pending,
            light_space: Mat4::IDENTITY,
        }
    }

    pub fn compile(&mut self, device: &wgpu::Device, layouts: &Layouts) {
        self.program = DepthProgram::compile(
            device,
            layouts,
            "shadow",
            wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
        );
    }

    /// Recompute the light-space matrix after the light moved
    pub fn set_light(&mut self, light_pos: Vec3, target: Vec3) {
        self.light_space = shadow_light_space(light_pos, target);
    }

    pub fn light_space(&self) -> Mat4 {
        self.light_space
    }

    /// Clear the shadow map and draw every caster into it.
    /// Without a compiled program the map is still cleared, so nothing is
    /// shadowed.
    pub fn record<'a>(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        casters: impl IntoIterator<Item = (&'a GpuMesh, &'a wgpu::BindGroup)>,
    ) {
        let program = self.program.get();
        if let Some(program) = program {
            program.write_light_space(queue, self.light_space);
        }

        let mut pass = self.target.begin_pass(encoder, "Shadow Pass");
        let Some(program) = program else {
            return;
        };
        pass.set_pipeline(&program.pipeline);
        pass.set_bind_group(0, &program.light_bind_group, &[]);
        for (mesh, model) in casters {
            pass.set_bind_group(1, model, &[]);
            mesh.draw(&mut pass);
        }
    }
}
