use bevy::math::DVec3;

use super::Plane;

/// The unit quad every tile node draws, shared by all nodes and scaled into
/// place by the node's transform. It lies in the local XZ plane, centred on
/// the origin, facing +Y.
pub struct TileGeometry;

impl TileGeometry {
    pub const SIZE: f64 = 1.0;
    pub const HALF_SIZE: f64 = Self::SIZE * 0.5;

    pub const PLANE: Plane = Plane {
        normal: DVec3::Y,
        distance: 0.0,
    };

    /// Whether a point on the tile plane falls inside the quad, edges included.
    pub fn contains(local: DVec3) -> bool {
        local.x.abs() <= Self::HALF_SIZE && local.z.abs() <= Self::HALF_SIZE
    }
}
