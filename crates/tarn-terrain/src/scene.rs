//! Everything generated on the CPU before the renderer uploads it

use crate::floor::Floor;
use crate::foliage::{place_trees, Tree};
use crate::props::MarkerCube;
use crate::water::Water;
use glam::{Mat4, Vec3};
use tarn_core::{Result, TarnConfig};

pub const MARKER_POSITION: Vec3 = Vec3::new(0.0, 1.0, 1.0);
pub const MARKER_SCALE: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct Scene {
    pub floor: Floor,
    /// `None` when water is disabled
    pub water: Option<Water>,
    pub trees: Vec<Tree>,
    pub marker: MarkerCube,
}

impl Scene {
    pub fn generate(config: &TarnConfig) -> Result<Self> {
        let floor = Floor::generate(&config.terrain)?;
        let water = if config.water.enabled {
            Some(Water::generate(&config.water)?)
        } else {
            log::info!("Water disabled");
            None
        };
        let trees = place_trees(floor.ground(), &config.foliage)?;
        log::info!("Placed {} trees", trees.len());
        let marker = MarkerCube::new(MARKER_POSITION, MARKER_SCALE)?;

        Ok(Self {
            floor,
            water,
            trees,
            marker,
        })
    }

    /// Tree model transforms, in the order of `trees`
    pub fn tree_transforms(&self) -> Vec<Mat4> {
        self.trees
            .iter()
            .map(|tree| tree.transform(self.floor.ground()))
            .collect()
    }

    /// Terrain height under a world position
    pub fn ground_height(&self, x: f32, z: f32) -> f32 {
        self.floor.height_at(x, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TarnConfig {
        let mut config = TarnConfig::default();
        config.terrain.tiles_x = 10;
        config.terrain.tiles_z = 10;
        config.terrain.tile_size = 1.0;
        config.terrain.mid_density = 2;
        config.terrain.detail_density = 2;
        config.water.tiles_x = 10;
        config.water.tiles_z = 10;
        config.water.tile_size = 1.0;
        config.water.detail_density = 2;
        config.foliage.count = 3;
        config.foliage.min_height = -10.0;
        config
    }

    #[test]
    fn generates_every_part() {
        let scene = Scene::generate(&small_config()).unwrap();
        assert!(scene.water.is_some());
        assert_eq!(scene.trees.len(), 3);
        assert_eq!(scene.tree_transforms().len(), 3);
        assert_eq!(scene.marker.position, MARKER_POSITION);
    }

    #[test]
    fn water_can_be_disabled() {
        let mut config = small_config();
        config.water.enabled = false;
        let scene = Scene::generate(&config).unwrap();
        assert!(scene.water.is_none());
    }

    #[test]
    fn trees_stand_on_the_ground() {
        let scene = Scene::generate(&small_config()).unwrap();
        for (tree, m) in scene.trees.iter().zip(scene.tree_transforms()) {
            let base = m.transform_point3(Vec3::ZERO);
            assert!((base.y - (scene.ground_height(tree.x, tree.z) - 0.01)).abs() < 1e-5);
        }
    }
}
