use std::sync::Arc;

use bevy::prelude::*;
use mapplane_scene::TileKey;

use crate::tile_mesh::TileMesh;

/// Builds the content of one kind of tile node.
///
/// Subdivision asks the parent's factory to decorate every child, so a tree
/// started with a given variant only ever grows nodes of that variant. The
/// coordinate and transform of a node are fixed by the quadtree and are not
/// the factory's concern.
pub trait MapNodeFactory: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Attaches variant specific components to a freshly constructed node.
    fn decorate(&self, world: &mut World, entity: Entity, key: TileKey);
}

#[derive(Component, Clone)]
pub struct NodeFactory(pub Arc<dyn MapNodeFactory>);

impl NodeFactory {
    pub fn new(factory: impl MapNodeFactory) -> Self {
        Self(Arc::new(factory))
    }
}

impl Default for NodeFactory {
    fn default() -> Self {
        Self::new(MapPlaneNodeFactory)
    }
}

impl std::fmt::Debug for NodeFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NodeFactory").field(&self.0.name()).finish()
    }
}

/// Flat plane tiles: the shared tile mesh plus a material of their own.
pub struct MapPlaneNodeFactory;

impl MapPlaneNodeFactory {
    fn level_color(level: u32) -> Color {
        Color::hsl((level * 47 % 360) as f32, 0.55, 0.55)
    }
}

impl MapNodeFactory for MapPlaneNodeFactory {
    fn name(&self) -> &'static str {
        "MapPlaneNode"
    }

    fn decorate(&self, world: &mut World, entity: Entity, key: TileKey) {
        let Some(mesh) = world.get_resource::<TileMesh>().map(|mesh| mesh.0.clone()) else {
            return;
        };
        let material = world
            .get_resource_mut::<Assets<StandardMaterial>>()
            .map(|mut materials| {
                materials.add(StandardMaterial {
                    base_color: Self::level_color(key.level),
                    perceptual_roughness: 1.0,
                    ..Default::default()
                })
            });
        let mut node = world.entity_mut(entity);
        node.insert(mesh);
        if let Some(material) = material {
            node.insert(material);
        }
    }
}
