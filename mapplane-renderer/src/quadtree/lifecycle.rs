use bevy::{ecs::event::Events, prelude::*};
use mapplane_scene::TileKey;

use super::node::{NodeLoadState, QuadtreeNode};
use crate::{
    datasource::{ActiveTileDataSource, TileLoadChannel, TileLoaded, TilePayload, TileRequest},
    error::QuadtreeError,
};

/// Sent once per node when it became ready and visible.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeReady {
    pub node: Entity,
    pub key: TileKey,
    pub map_view: Option<Entity>,
}

/// Starts loading a node. Returns `false` when the node already left
/// `Unloaded`, or when no data source is installed.
pub fn begin_node(world: &mut World, entity: Entity) -> Result<bool, QuadtreeError> {
    let key = world
        .get::<QuadtreeNode>(entity)
        .ok_or(QuadtreeError::NodeNotFound(entity))?
        .key();
    if world.get::<NodeLoadState>(entity) != Some(&NodeLoadState::Unloaded) {
        return Ok(false);
    }
    let Some(source) = world
        .get_resource::<ActiveTileDataSource>()
        .map(|source| source.0.clone())
    else {
        bevy::log::warn!("no tile data source installed, tile {} stays unloaded", key);
        return Ok(false);
    };
    let sender = world
        .get_resource_or_insert_with(TileLoadChannel::default)
        .sender
        .clone();
    if let Some(mut state) = world.get_mut::<NodeLoadState>(entity) {
        *state = NodeLoadState::Loading;
    }
    bevy::log::debug!("tile {} loading from {}", key, source.name());
    source.request(world, TileRequest::new(entity, key, sender));
    Ok(true)
}

/// Marks a loading node ready, shows it and notifies its map view.
///
/// Completions for nodes that were destroyed, or that are not loading, are
/// ignored and return `false`.
pub fn on_data_available(world: &mut World, loaded: TileLoaded) -> bool {
    let TileLoaded {
        entity,
        key,
        payload,
    } = loaded;
    let Some(node) = world.get::<QuadtreeNode>(entity) else {
        bevy::log::debug!("ignoring completion of destroyed tile {}", key);
        return false;
    };
    if node.key() != key {
        bevy::log::debug!("ignoring completion of tile {} for entity now holding {}", key, node.key());
        return false;
    }
    let map_view = node.map_view();
    match world.get_mut::<NodeLoadState>(entity) {
        Some(mut state) if *state == NodeLoadState::Loading => {
            *state = NodeLoadState::Ready;
        }
        _ => return false,
    }
    if let Some(mut visibility) = world.get_mut::<Visibility>(entity) {
        *visibility = Visibility::Visible;
    }
    if let Some(payload) = payload {
        world.entity_mut(entity).insert(TilePayload(payload));
    }
    bevy::log::debug!("tile {} ready", key);
    if let Some(mut events) = world.get_resource_mut::<Events<NodeReady>>() {
        events.send(NodeReady {
            node: entity,
            key,
            map_view,
        });
    }
    true
}

/// Delivers every completion that arrived since the last frame.
pub fn apply_completed_loads(world: &mut World) {
    let Some(receiver) = world
        .get_resource::<TileLoadChannel>()
        .map(|channel| channel.receiver.clone())
    else {
        return;
    };
    while let Ok(loaded) = receiver.try_recv() {
        on_data_available(world, loaded);
    }
}
