use bevy::{hierarchy::despawn_with_children_recursive, prelude::*};
use mapplane_scene::{Quadrant, TileKey};

use super::{
    construct::{attached_children, spawn_node, NodePlacement},
    factory::NodeFactory,
    lifecycle::begin_node,
    node::QuadtreeNode,
    storage::TileStorage,
};
use crate::error::QuadtreeError;

/// Splits a leaf into its four children and starts loading them.
///
/// Children are constructed with the parent's factory, ordered like
/// [`Quadrant::CHILDREN`], and stay hidden until their own data arrives.
/// A quadrant already filled through [`construct_node`](super::construct_node)
/// keeps that node. The parent keeps its state and visibility.
pub fn subdivide_node(world: &mut World, entity: Entity) -> Result<[Entity; 4], QuadtreeError> {
    let node = world
        .get::<QuadtreeNode>(entity)
        .ok_or(QuadtreeError::NodeNotFound(entity))?;
    let key = node.key();
    if !node.is_leaf() {
        return Err(QuadtreeError::AlreadySubdivided(key));
    }
    let child_keys = key
        .children()
        .ok_or(QuadtreeError::MaximumLevelReached(key))?;
    let map_view = node.map_view();
    let factory = world
        .get::<NodeFactory>(entity)
        .cloned()
        .unwrap_or_default();

    let attached = attached_children(world, entity);
    let mut children = [entity; 4];
    for (slot, (quadrant, child_key)) in children
        .iter_mut()
        .zip(Quadrant::CHILDREN.into_iter().zip(child_keys))
    {
        *slot = match attached.iter().find(|(occupied, _)| *occupied == quadrant) {
            Some((_, child)) => *child,
            None => spawn_node(
                world,
                NodePlacement {
                    key: child_key,
                    quadrant,
                    parent: Some(entity),
                    map_view,
                    factory: factory.clone(),
                },
            ),
        };
    }
    if let Some(mut node) = world.get_mut::<QuadtreeNode>(entity) {
        node.set_children(children);
    }
    bevy::log::debug!("subdivided tile {}", key);

    for child in children {
        begin_node(world, child)?;
    }
    Ok(children)
}

/// Destroys the whole subtree below a node, including children constructed
/// under it but not yet adopted by a subdivision. The node itself, its state
/// and its visibility are left alone. Returns `false` when there was nothing
/// below it.
///
/// Loads still in flight for destroyed nodes may complete later; they find
/// no entity and are dropped.
pub fn collapse_node(world: &mut World, entity: Entity) -> Result<bool, QuadtreeError> {
    let mut node = world
        .get_mut::<QuadtreeNode>(entity)
        .ok_or(QuadtreeError::NodeNotFound(entity))?;
    let key = node.key();
    let map_view = node.map_view();
    let mut children: Vec<Entity> = node
        .take_children()
        .map(|owned| owned.to_vec())
        .unwrap_or_default();
    for (_, child) in attached_children(world, entity) {
        if !children.contains(&child) {
            children.push(child);
        }
    }
    if children.is_empty() {
        return Ok(false);
    }

    let mut removed: Vec<(TileKey, Entity)> = Vec::new();
    let mut stack: Vec<Entity> = children.clone();
    while let Some(current) = stack.pop() {
        if let Some(node) = world.get::<QuadtreeNode>(current) {
            removed.push((node.key(), current));
            if let Some(grandchildren) = node.children() {
                stack.extend(grandchildren);
            }
        }
    }
    if let Some(view) = map_view {
        if let Some(mut storage) = world.get_mut::<TileStorage>(view) {
            for (key, entity) in &removed {
                storage.remove(key, *entity);
            }
        }
    }

    world.entity_mut(entity).remove_children(&children);
    for child in children {
        despawn_with_children_recursive(world, child);
    }
    bevy::log::debug!("collapsed tile {}, {} descendants removed", key, removed.len());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        map_view::MapViewBundle,
        quadtree::{
            construct::{construct_node, spawn_root_node},
            factory::MapNodeFactory,
            lifecycle::apply_completed_loads,
            node::NodeLoadState,
            testing::test_world,
        },
    };

    fn key_of(world: &World, entity: Entity) -> TileKey {
        world.get::<QuadtreeNode>(entity).unwrap().key()
    }

    #[test]
    fn root_splits_into_level_one() {
        let (mut world, _source) = test_world();
        let root = construct_node(&mut world, None, TileKey::ROOT, Quadrant::Root).unwrap();
        let children = subdivide_node(&mut world, root).unwrap();

        let keys: Vec<TileKey> = children.iter().map(|c| key_of(&world, *c)).collect();
        assert_eq!(
            keys,
            vec![
                TileKey::new(0, 0, 1),
                TileKey::new(1, 0, 1),
                TileKey::new(0, 1, 1),
                TileKey::new(1, 1, 1),
            ]
        );
        let offsets: Vec<Vec3> = children
            .iter()
            .map(|c| world.get::<Transform>(*c).unwrap().translation)
            .collect();
        assert_eq!(
            offsets,
            vec![
                Vec3::new(-0.25, 0.0, -0.25),
                Vec3::new(0.25, 0.0, -0.25),
                Vec3::new(-0.25, 0.0, 0.25),
                Vec3::new(0.25, 0.0, 0.25),
            ]
        );
        for (child, quadrant) in children.iter().zip(Quadrant::CHILDREN) {
            let node = world.get::<QuadtreeNode>(*child).unwrap();
            assert_eq!(node.quadrant(), quadrant);
            assert_eq!(node.parent(), Some(root));
            assert_eq!(world.get::<Visibility>(*child), Some(&Visibility::Hidden));
        }
        let parent = world.get::<QuadtreeNode>(root).unwrap();
        assert_eq!(parent.children(), Some(children));
        assert_eq!(parent.child(Quadrant::BottomLeft), Some(children[2]));
        assert_eq!(world.get::<Children>(root).unwrap().len(), 4);
    }

    #[test]
    fn subdividing_twice_is_rejected() {
        let (mut world, _source) = test_world();
        let root = construct_node(&mut world, None, TileKey::ROOT, Quadrant::Root).unwrap();
        let children = subdivide_node(&mut world, root).unwrap();
        assert_eq!(
            subdivide_node(&mut world, root),
            Err(QuadtreeError::AlreadySubdivided(TileKey::ROOT))
        );
        assert_eq!(
            world.get::<QuadtreeNode>(root).unwrap().children(),
            Some(children)
        );
        assert_eq!(world.get::<Children>(root).unwrap().len(), 4);
    }

    #[test]
    fn deep_subdivision_follows_the_pyramid() {
        let (mut world, _source) = test_world();
        let mut current = construct_node(&mut world, None, TileKey::ROOT, Quadrant::Root).unwrap();
        let path = [Quadrant::BottomRight, Quadrant::TopLeft, Quadrant::BottomLeft];
        for quadrant in path {
            let children = subdivide_node(&mut world, current).unwrap();
            current = children[quadrant.index().unwrap()];
        }
        assert_eq!(key_of(&world, current), TileKey::new(4, 5, 3));
        assert_eq!(
            world.get::<QuadtreeNode>(current).unwrap().quadrant(),
            Quadrant::BottomLeft
        );
    }

    #[test]
    fn deepest_level_cannot_split() {
        let (mut world, _source) = test_world();
        let root = construct_node(&mut world, None, TileKey::ROOT, Quadrant::Root).unwrap();
        let deep_key = TileKey::new(0, 0, TileKey::MAXIMUM_LEVEL);
        let deep = spawn_node(
            &mut world,
            NodePlacement {
                key: deep_key,
                quadrant: Quadrant::TopLeft,
                parent: Some(root),
                map_view: None,
                factory: NodeFactory::default(),
            },
        );
        assert_eq!(
            subdivide_node(&mut world, deep),
            Err(QuadtreeError::MaximumLevelReached(deep_key))
        );
    }

    #[test]
    fn collapse_keeps_the_parent_ready_and_visible() {
        let (mut world, source) = test_world();
        let root = construct_node(&mut world, None, TileKey::ROOT, Quadrant::Root).unwrap();
        begin_node(&mut world, root).unwrap();
        source.complete(TileKey::ROOT);
        apply_completed_loads(&mut world);

        let children = subdivide_node(&mut world, root).unwrap();
        subdivide_node(&mut world, children[1]).unwrap();
        assert_eq!(collapse_node(&mut world, root), Ok(true));

        for child in children {
            assert!(world.get_entity(child).is_none());
        }
        assert_eq!(world.query::<&QuadtreeNode>().iter(&world).count(), 1);
        assert_eq!(
            world.get::<NodeLoadState>(root),
            Some(&NodeLoadState::Ready)
        );
        assert_eq!(world.get::<Visibility>(root), Some(&Visibility::Visible));
        assert!(world.get::<QuadtreeNode>(root).unwrap().is_leaf());
        assert!(world
            .get::<Children>(root)
            .map_or(true, |children| children.is_empty()));

        assert_eq!(collapse_node(&mut world, root), Ok(false));
        assert_eq!(subdivide_node(&mut world, root).map(|c| c.len()), Ok(4));
    }

    #[test]
    fn constructed_child_is_adopted_and_dies_with_its_parent() {
        let (mut world, _source) = test_world();
        let view = world.spawn(MapViewBundle::new(1.0)).id();
        let root = spawn_root_node(&mut world, view, NodeFactory::default()).unwrap();
        let key = TileKey::new(0, 0, 1);
        let constructed =
            construct_node(&mut world, Some(root), key, Quadrant::TopLeft).unwrap();

        let children = subdivide_node(&mut world, root).unwrap();
        assert_eq!(children[0], constructed);
        assert_eq!(world.get::<Children>(root).unwrap().len(), 4);
        assert_eq!(world.query::<&QuadtreeNode>().iter(&world).count(), 5);
        assert_eq!(
            world.get::<TileStorage>(view).unwrap().get(&key),
            Some(constructed)
        );
        assert_eq!(
            world.get::<NodeLoadState>(constructed),
            Some(&NodeLoadState::Loading)
        );

        assert_eq!(collapse_node(&mut world, root), Ok(true));
        assert!(world.get_entity(constructed).is_none());
        assert_eq!(world.query::<&QuadtreeNode>().iter(&world).count(), 1);
        assert_eq!(world.get::<TileStorage>(view).unwrap().len(), 1);
    }

    #[test]
    fn collapse_removes_children_never_adopted() {
        let (mut world, _source) = test_world();
        let view = world.spawn(MapViewBundle::new(1.0)).id();
        let root = spawn_root_node(&mut world, view, NodeFactory::default()).unwrap();
        let constructed =
            construct_node(&mut world, Some(root), TileKey::new(1, 1, 1), Quadrant::BottomRight)
                .unwrap();

        assert_eq!(collapse_node(&mut world, root), Ok(true));
        assert!(world.get_entity(constructed).is_none());
        assert!(world.get::<QuadtreeNode>(root).unwrap().is_leaf());
        assert_eq!(world.get::<TileStorage>(view).unwrap().len(), 1);
        assert_eq!(collapse_node(&mut world, root), Ok(false));
    }

    #[test]
    fn storage_tracks_subdivide_and_collapse() {
        let (mut world, _source) = test_world();
        let view = world.spawn(MapViewBundle::new(1.0)).id();
        let root = spawn_root_node(&mut world, view, NodeFactory::default()).unwrap();
        let children = subdivide_node(&mut world, root).unwrap();
        let grandchildren = subdivide_node(&mut world, children[3]).unwrap();

        let storage = world.get::<TileStorage>(view).unwrap();
        assert_eq!(storage.len(), 9);
        assert_eq!(storage.get(&TileKey::new(3, 3, 2)), Some(grandchildren[3]));
        assert_eq!(storage.parent_of(&TileKey::new(3, 3, 2)), Some(children[3]));

        collapse_node(&mut world, children[3]).unwrap();
        let storage = world.get::<TileStorage>(view).unwrap();
        assert_eq!(storage.len(), 5);
        assert_eq!(
            storage.closest_loaded_ancestor(&TileKey::new(3, 3, 2)),
            Some((TileKey::new(1, 1, 1), children[3]))
        );

        collapse_node(&mut world, root).unwrap();
        let storage = world.get::<TileStorage>(view).unwrap();
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(&TileKey::ROOT), Some(root));
    }

    #[test]
    fn children_inherit_the_parent_factory() {
        struct Marked;
        #[derive(Component)]
        struct Mark;
        impl MapNodeFactory for Marked {
            fn name(&self) -> &'static str {
                "Marked"
            }
            fn decorate(&self, world: &mut World, entity: Entity, _key: TileKey) {
                world.entity_mut(entity).insert(Mark);
            }
        }

        let (mut world, _source) = test_world();
        let view = world.spawn(MapViewBundle::new(1.0)).id();
        let root = spawn_root_node(&mut world, view, NodeFactory::new(Marked)).unwrap();
        let children = subdivide_node(&mut world, root).unwrap();
        let grandchildren = subdivide_node(&mut world, children[0]).unwrap();
        for entity in [root].into_iter().chain(children).chain(grandchildren) {
            assert!(world.get::<Mark>(entity).is_some());
            assert_eq!(world.get::<NodeFactory>(entity).unwrap().0.name(), "Marked");
        }
    }
}
