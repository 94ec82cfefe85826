mod commands;
mod construct;
mod factory;
mod lifecycle;
mod node;
mod storage;
mod subdivide;

pub use commands::*;
pub use construct::{construct_node, spawn_root_node};
pub use factory::*;
pub use hit_test::*;
pub use lifecycle::*;
pub use node::*;
pub use storage::*;
pub use subdivide::*;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use bevy::{ecs::event::Events, prelude::*};

    use super::NodeReady;
    use crate::datasource::{testing::ManualDataSource, ActiveTileDataSource, TileLoadChannel};

    /// A bare world whose loads wait on the returned source.
    pub fn test_world() -> (World, Arc<ManualDataSource>) {
        let mut world = World::new();
        world.init_resource::<Events<NodeReady>>();
        world.init_resource::<TileLoadChannel>();
        let source = Arc::new(ManualDataSource::default());
        world.insert_resource(ActiveTileDataSource(source.clone()));
        (world, source)
    }
}
