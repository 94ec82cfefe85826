use std::fmt;

use bevy::prelude::*;

use crate::quadrant::Quadrant;

/// Address of a tile in the global pyramid. Level 0 is the single tile that
/// covers the whole map; level `L` is a `2^L x 2^L` grid with rows counted
/// from the top.
#[derive(Component, Default, Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TileKey {
    pub x: u32,
    pub y: u32,
    pub level: u32,
}

impl TileKey {
    /// Deepest level whose grid still fits in `u32` coordinates.
    pub const MAXIMUM_LEVEL: u32 = 31;

    pub const ROOT: TileKey = TileKey {
        x: 0,
        y: 0,
        level: 0,
    };

    pub fn new(x: u32, y: u32, level: u32) -> Self {
        Self { x, y, level }
    }

    /// Number of tiles along one axis at `level`.
    pub fn tiles_at_level(level: u32) -> u64 {
        1u64 << level.min(Self::MAXIMUM_LEVEL)
    }

    pub fn is_valid(&self) -> bool {
        self.level <= Self::MAXIMUM_LEVEL
            && u64::from(self.x) < Self::tiles_at_level(self.level)
            && u64::from(self.y) < Self::tiles_at_level(self.level)
    }

    /// Which quadrant of its parent this tile occupies.
    pub fn quadrant(&self) -> Quadrant {
        if self.level == 0 {
            return Quadrant::Root;
        }
        Quadrant::from_grid_offset(self.x & 1, self.y & 1).unwrap_or(Quadrant::Root)
    }

    pub fn child(&self, quadrant: Quadrant) -> Option<TileKey> {
        if self.level >= Self::MAXIMUM_LEVEL {
            return None;
        }
        let step = quadrant.grid_offset()?;
        Some(TileKey {
            x: self.x * 2 + step.x,
            y: self.y * 2 + step.y,
            level: self.level + 1,
        })
    }

    /// The four children, ordered like [`Quadrant::CHILDREN`].
    pub fn children(&self) -> Option<[TileKey; 4]> {
        if self.level >= Self::MAXIMUM_LEVEL {
            return None;
        }
        let mut children = [*self; 4];
        for (slot, quadrant) in children.iter_mut().zip(Quadrant::CHILDREN) {
            *slot = self.child(quadrant)?;
        }
        Some(children)
    }

    pub fn parent(&self) -> Option<TileKey> {
        if self.level == 0 {
            return None;
        }
        Some(TileKey {
            x: self.x / 2,
            y: self.y / 2,
            level: self.level - 1,
        })
    }

    /// Tile `dx` columns and `dy` rows away on the same level. The map does
    /// not wrap, so stepping off an edge yields `None`.
    pub fn neighbour(&self, dx: i64, dy: i64) -> Option<TileKey> {
        let size = Self::tiles_at_level(self.level);
        let x = u64::try_from(i64::from(self.x).checked_add(dx)?).ok()?;
        let y = u64::try_from(i64::from(self.y).checked_add(dy)?).ok()?;
        if x >= size || y >= size {
            return None;
        }
        Some(TileKey {
            x: u32::try_from(x).ok()?,
            y: u32::try_from(y).ok()?,
            level: self.level,
        })
    }

    pub fn is_ancestor_of(&self, other: &TileKey) -> bool {
        if other.level <= self.level {
            return false;
        }
        let shift = other.level - self.level;
        other.x >> shift == self.x && other.y >> shift == self.y
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.x, self.y)
    }
}
