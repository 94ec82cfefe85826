//! Pure tile pyramid model: addressing, quadrant placement and the ray tests
//! used to pick tiles. Nothing here touches the ECS world.

mod geometry;
pub mod math;
mod quadrant;
mod tile_key;
pub mod units;

pub use geometry::*;
pub use intersection_tests::*;
pub use quadrant::*;
pub use tile_key::*;
