use bevy::prelude::*;
use mapplane_scene::units::EARTH_PERIMETER;

#[derive(Resource, Clone, Debug)]
pub struct MapPlaneSettings {
    /// Side length, in world units, of the level-0 tile.
    pub world_scale: f32,
    /// Deepest level the LOD policy is expected to request.
    pub maximum_level: u32,
}

impl Default for MapPlaneSettings {
    fn default() -> Self {
        Self {
            world_scale: EARTH_PERIMETER as f32,
            maximum_level: 19,
        }
    }
}
