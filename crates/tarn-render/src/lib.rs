//! Tarn Render - wgpu renderer for the procedural terrain scene
//!
//! Each frame draws a shadow depth pass from the light, then the main pass:
//! normal-mapped terrain and the marker cube, trees, and finally the
//! alpha-blended water. The water reads a top-down land outline depth map
//! that is rendered once during boot.

mod boot;
mod camera;
mod context;
mod gpu_mesh;
mod material;
pub mod outline;
mod pipeline;
mod renderer;
pub mod shadow;
mod texture_cache;

pub use boot::{BootSequence, BootStage};
pub use camera::{FirstPersonCamera, MoveDir};
pub use context::{RenderContext, RenderError, DEPTH_FORMAT};
pub use gpu_mesh::{GpuChunkGrid, GpuMesh, MeshVertex};
pub use material::Material;
pub use outline::{land_space, LandOutlinePass};
pub use pipeline::{
    light_direction, DepthProgram, FrameUniforms, Layouts, LightSpaceUniforms, ModelUniforms,
    Program, ProgramKind,
};
pub use renderer::{TarnRenderer, SKY_COLOR, TIME_STEP};
pub use shadow::{shadow_light_space, ShadowPass};
pub use texture_cache::{GpuTexture, TextureCache, TextureKind, TextureSet, TextureSlot};

#[cfg(test)]
mod tests {
    #[test]
    fn depth_wgsl_parses() {
        let source = include_str!("depth.wgsl");
        naga::front::wgsl::parse_str(source).expect("depth.wgsl failed to parse");
    }

    #[test]
    fn terrain_wgsl_parses() {
        let source = include_str!("terrain.wgsl");
        naga::front::wgsl::parse_str(source).expect("terrain.wgsl failed to parse");
    }

    #[test]
    fn props_wgsl_parses() {
        let source = include_str!("props.wgsl");
        naga::front::wgsl::parse_str(source).expect("props.wgsl failed to parse");
    }

    #[test]
    fn water_wgsl_parses() {
        let source = include_str!("water.wgsl");
        naga::front::wgsl::parse_str(source).expect("water.wgsl failed to parse");
    }
}
