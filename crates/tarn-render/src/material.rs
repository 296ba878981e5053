//! Material bind groups (group 2): depth maps plus a diffuse/normal pair

use crate::outline::LandOutlinePass;
use crate::pipeline::Layouts;
use crate::shadow::ShadowPass;
use crate::texture_cache::{TextureCache, TextureSet};

pub struct Material {
    pub name: String,
    pub textures: TextureSet,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    /// Bind whatever the cache currently holds for `textures`; pending or
    /// failed entries bind the 1x1 defaults
    pub fn new(
        device: &wgpu::Device,
        layouts: &Layouts,
        name: &str,
        textures: TextureSet,
        cache: &TextureCache,
        shadow: &ShadowPass,
        outline: &LandOutlinePass,
    ) -> Self {
        let bind_group = bind(device, layouts, name, &textures, cache, shadow, outline);
        Self {
            name: name.to_string(),
            textures,
            bind_group,
        }
    }

    /// Rebuild the bind group after textures finished loading
    pub fn rebind(
        &mut self,
        device: &wgpu::Device,
        layouts: &Layouts,
        cache: &TextureCache,
        shadow: &ShadowPass,
        outline: &LandOutlinePass,
    ) {
        self.bind_group = bind(device, layouts, &self.name, &self.textures, cache, shadow, outline);
    }
}

fn bind(
    device: &wgpu::Device,
    layouts: &Layouts,
    name: &str,
    textures: &TextureSet,
    cache: &TextureCache,
    shadow: &ShadowPass,
    outline: &LandOutlinePass,
) -> wgpu::BindGroup {
    let diffuse = textures.diffuse(cache);
    let normal = textures.normal_map(cache);

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{} Material Bind Group", name)),
        layout: &layouts.material,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&shadow.target.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&shadow.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&diffuse.view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(&diffuse.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::TextureView(&outline.target.view),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: wgpu::BindingResource::TextureView(&normal.view),
            },
            wgpu::BindGroupEntry {
                binding: 6,
                resource: wgpu::BindingResource::Sampler(&normal.sampler),
            },
        ],
    })
}
