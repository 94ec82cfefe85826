use bevy::prelude::Entity;
use mapplane_scene::{Quadrant, TileKey};

/// Contract violations of the quadtree operations. Data loading failures are
/// not represented here; a failed load simply leaves the node `Loading`.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum QuadtreeError {
    #[error("quadrant {quadrant:?} does not match parent presence (has parent: {has_parent})")]
    InvalidQuadrant { quadrant: Quadrant, has_parent: bool },
    #[error("tile {0} is already subdivided")]
    AlreadySubdivided(TileKey),
    #[error("tile {key} is not a valid {quadrant:?} node at this position in the pyramid")]
    InvalidCoordinate { key: TileKey, quadrant: Quadrant },
    #[error("tile {0} is at the deepest level and cannot be subdivided")]
    MaximumLevelReached(TileKey),
    #[error("entity {0:?} is not a quadtree node")]
    NodeNotFound(Entity),
    #[error("entity {0:?} is not a map view")]
    MapViewNotFound(Entity),
    #[error("tile {0} already has a live node")]
    TileOccupied(TileKey),
}
