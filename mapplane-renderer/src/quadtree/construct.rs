use bevy::prelude::*;
use mapplane_scene::{Quadrant, TileKey};

use super::{
    factory::NodeFactory,
    node::{QuadtreeNode, QuadtreeNodeBundle},
    storage::TileStorage,
};
use crate::{error::QuadtreeError, map_view::MapView};

pub(crate) struct NodePlacement {
    pub key: TileKey,
    pub quadrant: Quadrant,
    pub parent: Option<Entity>,
    pub map_view: Option<Entity>,
    pub factory: NodeFactory,
}

/// Spawns a node that is already known to be well formed.
///
/// The node is attached to its scene-graph parent right away (the parent
/// node, or the map view for a root), so its transform is live before it
/// loads.
pub(crate) fn spawn_node(world: &mut World, placement: NodePlacement) -> Entity {
    let NodePlacement {
        key,
        quadrant,
        parent,
        map_view,
        factory,
    } = placement;
    let node = QuadtreeNode::new(key, quadrant, parent, map_view);
    let entity = world
        .spawn(QuadtreeNodeBundle::new(node, factory.clone()))
        .id();
    if let Some(scene_parent) = parent.or(map_view) {
        world.entity_mut(scene_parent).add_child(entity);
    }
    if let Some(view) = map_view {
        if let Some(mut storage) = world.get_mut::<TileStorage>(view) {
            storage.set(&key, entity);
        }
    }
    factory.0.decorate(world, entity, key);
    bevy::log::debug!("constructed {} tile {:?} {}", factory.0.name(), quadrant, key);
    entity
}

/// Nodes already hanging below `parent` in the scene graph, with the
/// quadrant each occupies.
pub(crate) fn attached_children(world: &World, parent: Entity) -> Vec<(Quadrant, Entity)> {
    let Some(children) = world.get::<Children>(parent) else {
        return Vec::new();
    };
    children
        .iter()
        .filter_map(|child| {
            let node = world.get::<QuadtreeNode>(*child)?;
            (node.parent() == Some(parent)).then_some((node.quadrant(), *child))
        })
        .collect()
}

fn ensure_vacant(world: &World, map_view: Option<Entity>, key: TileKey) -> Result<(), QuadtreeError> {
    let occupant = map_view
        .and_then(|view| world.get::<TileStorage>(view))
        .and_then(|storage| storage.get(&key));
    match occupant {
        Some(entity) if world.get::<QuadtreeNode>(entity).is_some() => {
            Err(QuadtreeError::TileOccupied(key))
        }
        _ => Ok(()),
    }
}

fn validate(parent_key: Option<TileKey>, key: TileKey, quadrant: Quadrant) -> Result<(), QuadtreeError> {
    if quadrant.is_root() == parent_key.is_some() {
        return Err(QuadtreeError::InvalidQuadrant {
            quadrant,
            has_parent: parent_key.is_some(),
        });
    }
    let well_placed = match parent_key {
        None => key == TileKey::ROOT,
        Some(parent_key) => key.is_valid() && parent_key.child(quadrant) == Some(key),
    };
    if !well_placed {
        return Err(QuadtreeError::InvalidCoordinate { key, quadrant });
    }
    Ok(())
}

/// Constructs a hidden, unloaded node.
///
/// A root (`parent == None`) must use [`Quadrant::Root`] and the level-0 key;
/// any other node must name its parent and the quadrant its key occupies
/// there. Children inherit the parent's factory and map view. Construction
/// does not start loading; see [`begin_node`](super::begin_node).
///
/// A child constructed this way belongs to its parent from the start: a
/// later [`subdivide_node`](super::subdivide_node) adopts it into its
/// quadrant and [`collapse_node`](super::collapse_node) destroys it. A slot
/// can hold one node only, so constructing into a subdivided parent, a taken
/// quadrant or a key with a live node fails with `TileOccupied`.
pub fn construct_node(
    world: &mut World,
    parent: Option<Entity>,
    key: TileKey,
    quadrant: Quadrant,
) -> Result<Entity, QuadtreeError> {
    let (parent_key, parent_is_leaf, factory, map_view) = match parent {
        Some(parent) => {
            let node = world
                .get::<QuadtreeNode>(parent)
                .ok_or(QuadtreeError::NodeNotFound(parent))?;
            let factory = world
                .get::<NodeFactory>(parent)
                .cloned()
                .unwrap_or_default();
            (Some(node.key()), node.is_leaf(), factory, node.map_view())
        }
        None => (None, true, NodeFactory::default(), None),
    };
    validate(parent_key, key, quadrant)?;
    if let Some(parent) = parent {
        let taken = attached_children(world, parent)
            .iter()
            .any(|(occupied, _)| *occupied == quadrant);
        if !parent_is_leaf || taken {
            return Err(QuadtreeError::TileOccupied(key));
        }
    }
    ensure_vacant(world, map_view, key)?;
    Ok(spawn_node(
        world,
        NodePlacement {
            key,
            quadrant,
            parent,
            map_view,
            factory,
        },
    ))
}

/// Constructs the root node of `map_view` with the given node variant.
pub fn spawn_root_node(
    world: &mut World,
    map_view: Entity,
    factory: NodeFactory,
) -> Result<Entity, QuadtreeError> {
    if world.get::<MapView>(map_view).is_none() {
        return Err(QuadtreeError::MapViewNotFound(map_view));
    }
    ensure_vacant(world, Some(map_view), TileKey::ROOT)?;
    bevy::log::info!("new root tile {} under map view {:?}", TileKey::ROOT, map_view);
    Ok(spawn_node(
        world,
        NodePlacement {
            key: TileKey::ROOT,
            quadrant: Quadrant::Root,
            parent: None,
            map_view: Some(map_view),
            factory,
        },
    ))
}
