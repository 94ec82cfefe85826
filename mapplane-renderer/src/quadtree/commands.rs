use bevy::prelude::*;

use super::{
    construct::spawn_root_node, factory::NodeFactory, lifecycle::begin_node,
    subdivide::{collapse_node, subdivide_node},
};

/// Deferred quadtree operations for systems that only hold `Commands`.
/// Contract violations are logged when the commands are applied.
pub trait QuadtreeCommandsExt {
    fn subdivide_node(&mut self, entity: Entity);
    fn collapse_node(&mut self, entity: Entity);
    fn begin_node(&mut self, entity: Entity);
    /// Spawns and begins the root of `map_view`.
    fn spawn_root_node(&mut self, map_view: Entity, factory: NodeFactory);
}

impl<'w, 's> QuadtreeCommandsExt for Commands<'w, 's> {
    fn subdivide_node(&mut self, entity: Entity) {
        self.add(move |world: &mut World| {
            if let Err(e) = subdivide_node(world, entity) {
                bevy::log::error!("subdivide failed: {}", e);
            }
        });
    }

    fn collapse_node(&mut self, entity: Entity) {
        self.add(move |world: &mut World| {
            if let Err(e) = collapse_node(world, entity) {
                bevy::log::error!("collapse failed: {}", e);
            }
        });
    }

    fn begin_node(&mut self, entity: Entity) {
        self.add(move |world: &mut World| {
            if let Err(e) = begin_node(world, entity) {
                bevy::log::error!("begin failed: {}", e);
            }
        });
    }

    fn spawn_root_node(&mut self, map_view: Entity, factory: NodeFactory) {
        self.add(move |world: &mut World| {
            match spawn_root_node(world, map_view, factory)
                .and_then(|root| begin_node(world, root))
            {
                Ok(_) => {}
                Err(e) => bevy::log::error!("could not start map view {:?}: {}", map_view, e),
            }
        });
    }
}
