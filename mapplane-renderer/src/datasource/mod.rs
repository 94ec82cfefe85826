use std::sync::Arc;

use bevy::prelude::*;
use mapplane_scene::TileKey;

mod xyz;
pub use xyz::*;

/// Acquires the data of a tile.
///
/// `request` is called once per node when its load begins. The source owns
/// everything that happens next: it may complete at once, hand the request
/// to an async job, retry, or drop it. Dropping the completion leaves the
/// node loading forever, which is how failures show up in the quadtree.
pub trait TileDataSource: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn request(&self, world: &mut World, request: TileRequest);
}

/// The data source new loads are sent to.
#[derive(Resource, Clone)]
pub struct ActiveTileDataSource(pub Arc<dyn TileDataSource>);

impl ActiveTileDataSource {
    pub fn new(source: impl TileDataSource) -> Self {
        Self(Arc::new(source))
    }
}

/// Opaque bytes handed over by the data source when a tile finished loading.
#[derive(Component, Clone, Debug)]
pub struct TilePayload(pub bytes::Bytes);

/// Message sent back to the main thread when a load finished.
#[derive(Debug, Clone)]
pub struct TileLoaded {
    pub entity: Entity,
    pub key: TileKey,
    pub payload: Option<bytes::Bytes>,
}

#[derive(Resource)]
pub struct TileLoadChannel {
    pub sender: async_channel::Sender<TileLoaded>,
    pub receiver: async_channel::Receiver<TileLoaded>,
}

impl Default for TileLoadChannel {
    fn default() -> Self {
        let (sender, receiver) = async_channel::unbounded();
        Self { sender, receiver }
    }
}

/// Single-shot completion handle for one node load. Consumed on use, so a
/// load can complete at most once.
#[derive(Debug)]
pub struct LoadCompletion {
    entity: Entity,
    key: TileKey,
    sender: async_channel::Sender<TileLoaded>,
}

impl LoadCompletion {
    pub fn key(&self) -> TileKey {
        self.key
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn complete(self, payload: Option<bytes::Bytes>) {
        let loaded = TileLoaded {
            entity: self.entity,
            key: self.key,
            payload,
        };
        if let Err(e) = self.sender.try_send(loaded) {
            bevy::log::warn!("tile {} finished after its channel closed: {}", self.key, e);
        }
    }
}

pub struct TileRequest {
    pub key: TileKey,
    pub completion: LoadCompletion,
}

impl TileRequest {
    pub fn new(entity: Entity, key: TileKey, sender: async_channel::Sender<TileLoaded>) -> Self {
        Self {
            key,
            completion: LoadCompletion {
                entity,
                key,
                sender,
            },
        }
    }
}

/// Completes every request on the spot, as a warm cache would.
pub struct ImmediateDataSource;

impl TileDataSource for ImmediateDataSource {
    fn name(&self) -> &str {
        "immediate"
    }

    fn request(&self, _world: &mut World, request: TileRequest) {
        request.completion.complete(None);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_sends_exactly_one_message() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let channel = TileLoadChannel::default();
        let key = TileKey::new(1, 0, 1);
        let request = TileRequest::new(entity, key, channel.sender.clone());

        ImmediateDataSource.request(&mut world, request);

        let loaded = channel.receiver.try_recv().unwrap();
        assert_eq!(loaded.entity, entity);
        assert_eq!(loaded.key, key);
        assert!(loaded.payload.is_none());
        assert!(channel.receiver.try_recv().is_err());
    }
}
