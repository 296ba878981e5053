//! GPU textures loaded from disk, with built-in 1x1 fallbacks

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::Path;
use tarn_core::{Readiness, TarnError};
use wgpu::util::DeviceExt;

/// Number of mip levels down to 1x1
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Every mip level of `base`, largest first, packed back to back for upload
pub fn mip_chain(base: &RgbaImage) -> (u32, Vec<u8>) {
    let (width, height) = base.dimensions();
    let levels = mip_level_count(width, height);
    let mut data = base.as_raw().clone();
    for level in 1..levels {
        let w = (width >> level).max(1);
        let h = (height >> level).max(1);
        let mip = image::imageops::resize(base, w, h, FilterType::Triangle);
        data.extend_from_slice(mip.as_raw());
    }
    (levels, data)
}

/// Texture unit a program samples from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    ShadowDepth = 0,
    Diffuse = 1,
    OutlineDepth = 2,
    NormalMap = 3,
}

impl TryFrom<u32> for TextureSlot {
    type Error = TarnError;

    fn try_from(slot: u32) -> Result<Self, Self::Error> {
        match slot {
            0 => Ok(TextureSlot::ShadowDepth),
            1 => Ok(TextureSlot::Diffuse),
            2 => Ok(TextureSlot::OutlineDepth),
            3 => Ok(TextureSlot::NormalMap),
            other => Err(TarnError::InvalidTextureSlot(other)),
        }
    }
}

/// Colour textures are sRGB, normal maps are linear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Color,
    Normal,
}

impl TextureKind {
    fn format(self) -> wgpu::TextureFormat {
        match self {
            TextureKind::Color => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureKind::Normal => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// A GPU-resident texture with its view and sampler
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Cache of named textures. Entries stay `Pending` until loaded and become
/// `Failed` when the file can't be decoded; both resolve to a default.
pub struct TextureCache {
    textures: HashMap<String, (TextureKind, Readiness<GpuTexture>)>,
    /// 1x1 white texture (default diffuse)
    pub default_white: GpuTexture,
    /// 1x1 flat normal map (0.5, 0.5, 1.0) = straight up
    pub default_normal: GpuTexture,
}

impl TextureCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let default_white = Self::create_1x1(
            device,
            queue,
            [255, 255, 255, 255],
            TextureKind::Color,
            "Default White",
        );
        let default_normal = Self::create_1x1(
            device,
            queue,
            [128, 128, 255, 255],
            TextureKind::Normal,
            "Default Normal",
        );

        Self {
            textures: HashMap::new(),
            default_white,
            default_normal,
        }
    }

    fn create_1x1(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color: [u8; 4],
        kind: TextureKind,
        label: &str,
    ) -> GpuTexture {
        let pixel = RgbaImage::from_pixel(1, 1, Rgba(color));
        Self::create(device, queue, label, kind, &pixel)
    }

    fn create(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        kind: TextureKind,
        rgba: &RgbaImage,
    ) -> GpuTexture {
        let (width, height) = rgba.dimensions();
        let (mip_level_count, data) = mip_chain(rgba);
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: kind.format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            ..Default::default()
        });

        GpuTexture {
            texture,
            view,
            sampler,
        }
    }

    /// Register a texture name before it is loaded
    pub fn request(&mut self, name: &str, kind: TextureKind) {
        self.textures
            .entry(name.to_string())
            .or_insert((kind, Readiness::Pending));
    }

    /// Load a texture from an image file on disk.
    /// A decode failure is recorded as `Failed` and logged, never returned.
    pub fn load_file(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        path: &Path,
        kind: TextureKind,
    ) {
        if self.is_ready(name) {
            return;
        }

        let loaded = image::open(path)
            .map(|img| img.to_rgba8())
            .map_err(|e| format!("failed to open image '{}': {}", path.display(), e))
            .map(|rgba| Self::create(device, queue, name, kind, &rgba));

        match &loaded {
            Ok(_) => log::info!("Loaded texture '{}' from {}", name, path.display()),
            Err(e) => log::error!("Texture '{}': {}; using default", name, e),
        }
        self.textures
            .insert(name.to_string(), (kind, Readiness::from_result(loaded)));
    }

    pub fn is_ready(&self, name: &str) -> bool {
        self.state(name).is_some_and(|r| r.is_ready())
    }

    pub fn state(&self, name: &str) -> Option<&Readiness<GpuTexture>> {
        self.textures.get(name).map(|(_, r)| r)
    }

    /// The named texture, or the default for its kind while it is pending,
    /// failed or unknown
    pub fn resolve(&self, name: &str, kind: TextureKind) -> &GpuTexture {
        let fallback = match kind {
            TextureKind::Color => &self.default_white,
            TextureKind::Normal => &self.default_normal,
        };
        match self.textures.get(name) {
            Some((_, readiness)) => readiness.get_or(fallback),
            None => fallback,
        }
    }
}

/// The diffuse and normal-map names a material binds at slots 1 and 3
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureSet {
    pub diffuse: Option<String>,
    pub normal_map: Option<String>,
}

impl TextureSet {
    /// Build a set from `(slot, texture)` pairs. Pairs naming an invalid or
    /// depth slot are logged and skipped.
    pub fn from_slots(slots: &[(u32, &str)]) -> Self {
        let mut set = Self::default();
        for &(slot, name) in slots {
            // Rejections are already logged by `assign`
            let _ = set.assign(slot, name);
        }
        set
    }

    /// Assign a named texture to a slot number.
    /// Depth slots are owned by the render passes and can't be reassigned;
    /// unknown slots are rejected. Either way nothing changes.
    pub fn assign(&mut self, slot: u32, name: &str) -> tarn_core::Result<()> {
        let slot = TextureSlot::try_from(slot).inspect_err(|e| log::warn!("{}", e))?;
        match slot {
            TextureSlot::Diffuse => self.diffuse = Some(name.to_string()),
            TextureSlot::NormalMap => self.normal_map = Some(name.to_string()),
            TextureSlot::ShadowDepth | TextureSlot::OutlineDepth => {
                log::warn!("Texture slot {:?} is reserved for depth maps", slot);
                return Err(TarnError::InvalidTextureSlot(slot as u32));
            }
        }
        Ok(())
    }

    pub fn diffuse<'a>(&self, cache: &'a TextureCache) -> &'a GpuTexture {
        cache.resolve(self.diffuse.as_deref().unwrap_or_default(), TextureKind::Color)
    }

    pub fn normal_map<'a>(&self, cache: &'a TextureCache) -> &'a GpuTexture {
        cache.resolve(self.normal_map.as_deref().unwrap_or_default(), TextureKind::Normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_parse() {
        assert_eq!(TextureSlot::try_from(0).unwrap(), TextureSlot::ShadowDepth);
        assert_eq!(TextureSlot::try_from(1).unwrap(), TextureSlot::Diffuse);
        assert_eq!(TextureSlot::try_from(2).unwrap(), TextureSlot::OutlineDepth);
        assert_eq!(TextureSlot::try_from(3).unwrap(), TextureSlot::NormalMap);
        assert!(matches!(
            TextureSlot::try_from(4),
            Err(TarnError::InvalidTextureSlot(4))
        ));
    }

    #[test]
    fn invalid_slot_leaves_set_untouched() {
        let mut set = TextureSet::from_slots(&[(1, "dirt"), (3, "dirt_normal")]);
        let before = set.clone();
        assert!(set.assign(7, "water").is_err());
        assert!(set.assign(0, "water").is_err());
        assert_eq!(set, before);
    }

    #[test]
    fn material_slots_assign() {
        let set = TextureSet::from_slots(&[(1, "tree"), (3, "flat")]);
        assert_eq!(set.diffuse.as_deref(), Some("tree"));
        assert_eq!(set.normal_map.as_deref(), Some("flat"));
    }

    #[test]
    fn bad_slots_are_skipped_when_building() {
        let set = TextureSet::from_slots(&[(1, "dirt"), (2, "water"), (9, "sky"), (3, "dirt_normal")]);
        assert_eq!(set.diffuse.as_deref(), Some("dirt"));
        assert_eq!(set.normal_map.as_deref(), Some("dirt_normal"));
    }

    #[test]
    fn mip_levels_reach_one_pixel() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(1024, 512), 11);
        assert_eq!(mip_level_count(300, 200), 9);
        assert_eq!(mip_level_count(0, 0), 1);
    }

    #[test]
    fn mip_chain_packs_every_level() {
        let base = RgbaImage::from_pixel(4, 2, Rgba([200, 100, 50, 255]));
        let (levels, data) = mip_chain(&base);
        assert_eq!(levels, 3);
        // 4x2 + 2x1 + 1x1 texels
        assert_eq!(data.len(), (8 + 2 + 1) * 4);
        // A flat colour stays flat at every level
        for px in data.chunks_exact(4) {
            for (got, want) in px.iter().zip([200u8, 100, 50, 255]) {
                assert!(got.abs_diff(want) <= 1);
            }
        }
    }
}
