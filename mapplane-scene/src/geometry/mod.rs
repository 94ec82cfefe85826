mod plane;
mod ray;
mod tile_geometry;

pub use plane::*;
pub use ray::*;
pub use tile_geometry::*;
