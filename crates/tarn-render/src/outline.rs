//! Top-down land outline
//!
//! The detail terrain is rendered once, straight down from above, into a
//! high-resolution depth map. The water program compares its own depth in
//! the same space against it to find the shoreline.

use crate::gpu_mesh::GpuChunkGrid;
use crate::pipeline::{DepthProgram, DepthTarget, Layouts};
use glam::{Mat4, Vec3};
use tarn_core::Readiness;
use tarn_terrain::LodTier;

/// Half-extent of the outline frustum
pub const OUTLINE_EXTENT: f32 = 5.0;
pub const OUTLINE_NEAR: f32 = 0.1;
pub const OUTLINE_FAR: f32 = 20.0;
/// Height of the downward-looking outline camera
pub const OUTLINE_HEIGHT: f32 = 10.0;

/// Orthographic projection from a camera above the origin looking down -Y
pub fn land_space() -> Mat4 {
    let proj = Mat4::orthographic_rh(
        -OUTLINE_EXTENT,
        OUTLINE_EXTENT,
        -OUTLINE_EXTENT,
        OUTLINE_EXTENT,
        OUTLINE_NEAR,
        OUTLINE_FAR,
    );
    let look_down = Mat4::from_translation(Vec3::new(0.0, OUTLINE_HEIGHT, 0.0))
        * Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2);
    proj * look_down.inverse()
}

pub struct LandOutlinePass {
    pub target: DepthTarget,
    pub program: Readiness<DepthProgram>,
    land_space: Mat4,
    rendered: bool,
}

impl LandOutlinePass {
    pub fn new(device: &wgpu::Device, resolution: u32) -> Self {
        Self {
            target: DepthTarget::new(device, "Land Outline Map", resolution),
            program: Readiness::Pending,
            land_space: land_space(),
            rendered: false,
        }
    }

    pub fn compile(&mut self, device: &wgpu::Device, layouts: &Layouts) {
        // No bias: the water compares exact depths
        self.program =
            DepthProgram::compile(device, layouts, "land outline", wgpu::DepthBiasState::default());
    }

    pub fn land_space(&self) -> Mat4 {
        self.land_space
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Render the detail tier of the terrain once. `identity` is a model
    /// binding holding the identity transform.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        terrain: &GpuChunkGrid,
        identity: &wgpu::BindGroup,
    ) -> tarn_core::Result<()> {
        let program = match &self.program {
            Readiness::Ready(program) => program,
            Readiness::Failed(reason) => {
                return Err(tarn_core::TarnError::RenderError(format!(
                    "land outline program unavailable: {}",
                    reason
                )))
            }
            Readiness::Pending => {
                return Err(tarn_core::TarnError::RenderError(
                    "land outline program not compiled".to_string(),
                ))
            }
        };
        program.write_light_space(queue, self.land_space);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Land Outline Encoder"),
        });
        {
            let mut pass = self.target.begin_pass(&mut encoder, "Land Outline Pass");
            pass.set_pipeline(&program.pipeline);
            pass.set_bind_group(0, &program.light_bind_group, &[]);
            pass.set_bind_group(1, identity, &[]);
            for mesh in terrain.at_tier(LodTier::Detail) {
                mesh.draw(&mut pass);
            }
        }
        queue.submit(std::iter::once(encoder.finish()));

        self.rendered = true;
        log::info!(
            "Land outline rendered at {}x{}",
            self.target.resolution,
            self.target.resolution
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn looks_straight_down() {
        let space = land_space();
        // Ground origin at the centre of the map, 10 units from the camera
        let origin = space * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin.x.abs() < 1e-5 && origin.y.abs() < 1e-5);
        let expected = (OUTLINE_HEIGHT - OUTLINE_NEAR) / (OUTLINE_FAR - OUTLINE_NEAR);
        assert!((origin.z - expected).abs() < 1e-5);
    }

    #[test]
    fn higher_ground_is_shallower() {
        let space = land_space();
        let low = space * Vec4::new(1.0, -0.5, 2.0, 1.0);
        let high = space * Vec4::new(1.0, 0.5, 2.0, 1.0);
        assert!(high.z < low.z);
        assert!((high.x - low.x).abs() < 1e-6 && (high.y - low.y).abs() < 1e-6);
    }

    #[test]
    fn covers_the_terrain_square() {
        let space = land_space();
        for (x, z) in [(-5.0, -5.0), (5.0, 5.0), (4.9, -4.9)] {
            let ndc = space * Vec4::new(x, 0.0, z, 1.0);
            assert!(ndc.x.abs() <= 1.0 + 1e-5 && ndc.y.abs() <= 1.0 + 1e-5);
        }
    }
}
