use bevy::{prelude::*, utils::HashMap};
use mapplane_scene::{Quadrant, TileKey};

/// Used to store tile entities for fast look up.
///
/// Lives on the map view entity and indexes every live node of that view by
/// its key, so relatives of a tile are found from coordinates alone.
#[derive(Component, Default, Debug, Clone)]
pub struct TileStorage {
    tiles: HashMap<TileKey, Entity>,
}

impl TileStorage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, tile_key: &TileKey) -> Option<Entity> {
        self.tiles.get(tile_key).copied()
    }

    pub fn set(&mut self, tile_key: &TileKey, tile_entity: Entity) {
        self.tiles.insert(*tile_key, tile_entity);
    }

    /// Removes `tile_key` only if it still points at `tile_entity`.
    pub fn remove(&mut self, tile_key: &TileKey, tile_entity: Entity) -> bool {
        if self.get(tile_key) == Some(tile_entity) {
            self.tiles.remove(tile_key);
            return true;
        }
        false
    }

    pub fn contains(&self, tile_key: &TileKey) -> bool {
        self.tiles.contains_key(tile_key)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TileKey, &Entity)> {
        self.tiles.iter()
    }

    pub fn parent_of(&self, tile_key: &TileKey) -> Option<Entity> {
        self.get(&tile_key.parent()?)
    }

    pub fn child_of(&self, tile_key: &TileKey, quadrant: Quadrant) -> Option<Entity> {
        self.get(&tile_key.child(quadrant)?)
    }

    pub fn neighbour_of(&self, tile_key: &TileKey, dx: i64, dy: i64) -> Option<Entity> {
        self.get(&tile_key.neighbour(dx, dy)?)
    }

    /// The deepest live tile that is `tile_key` or one of its ancestors.
    pub fn closest_loaded_ancestor(&self, tile_key: &TileKey) -> Option<(TileKey, Entity)> {
        let mut key = Some(*tile_key);
        while let Some(current) = key {
            if let Some(entity) = self.get(&current) {
                return Some((current, entity));
            }
            key = current.parent();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_by_relationship() {
        let mut world = World::new();
        let root = world.spawn_empty().id();
        let right = world.spawn_empty().id();
        let left = world.spawn_empty().id();
        let mut storage = TileStorage::empty();
        storage.set(&TileKey::ROOT, root);
        storage.set(&TileKey::new(1, 0, 1), right);
        storage.set(&TileKey::new(0, 0, 1), left);

        assert_eq!(storage.parent_of(&TileKey::new(1, 0, 1)), Some(root));
        assert_eq!(storage.child_of(&TileKey::ROOT, Quadrant::TopRight), Some(right));
        assert_eq!(storage.child_of(&TileKey::ROOT, Quadrant::BottomLeft), None);
        assert_eq!(storage.neighbour_of(&TileKey::new(0, 0, 1), 1, 0), Some(right));
        assert_eq!(storage.neighbour_of(&TileKey::new(0, 0, 1), -1, 0), None);
        assert_eq!(
            storage.closest_loaded_ancestor(&TileKey::new(5, 6, 3)),
            Some((TileKey::ROOT, root))
        );
        assert_eq!(
            storage.closest_loaded_ancestor(&TileKey::new(3, 1, 2)),
            Some((TileKey::new(1, 0, 1), right))
        );
    }

    #[test]
    fn remove_ignores_stale_entities() {
        let mut world = World::new();
        let old = world.spawn_empty().id();
        let new = world.spawn_empty().id();
        let key = TileKey::new(0, 1, 1);
        let mut storage = TileStorage::empty();
        storage.set(&key, new);

        assert!(!storage.remove(&key, old));
        assert_eq!(storage.get(&key), Some(new));
        assert!(storage.remove(&key, new));
        assert!(storage.is_empty());
    }
}
