use bevy::prelude::*;

use crate::quadtree::{NodeReady, TileStorage};

/// Owner of one quadtree. Nodes of the tree live below this entity in the
/// scene graph, so the view's transform scales the unit root tile to world
/// size.
#[derive(Component, Default, Debug)]
pub struct MapView {
    lod_update_requested: bool,
    ready_tiles: usize,
}

impl MapView {
    /// Number of nodes that became ready under this view.
    pub fn ready_tiles(&self) -> usize {
        self.ready_tiles
    }

    pub fn request_lod_update(&mut self) {
        self.lod_update_requested = true;
    }

    /// Returns whether a level-of-detail pass was requested and clears it.
    pub fn take_lod_update_request(&mut self) -> bool {
        std::mem::take(&mut self.lod_update_requested)
    }
}

#[derive(Bundle)]
pub struct MapViewBundle {
    pub map_view: MapView,
    pub storage: TileStorage,
    pub spatial: SpatialBundle,
}

impl MapViewBundle {
    pub fn new(world_scale: f32) -> Self {
        Self {
            map_view: MapView::default(),
            storage: TileStorage::empty(),
            spatial: SpatialBundle::from_transform(Transform::from_scale(Vec3::new(
                world_scale,
                1.0,
                world_scale,
            ))),
        }
    }
}

/// A freshly shown tile changes what the map looks like, so its view should
/// re-run level of detail.
pub fn on_node_ready(mut events: EventReader<NodeReady>, mut views: Query<&mut MapView>) {
    for event in events.iter() {
        let Some(view) = event.map_view else {
            continue;
        };
        if let Ok(mut map_view) = views.get_mut(view) {
            map_view.ready_tiles += 1;
            map_view.request_lod_update();
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::ecs::event::Events;
    use mapplane_scene::TileKey;

    use super::*;

    #[test]
    fn ready_events_request_lod_update_on_their_view() {
        let mut app = App::new();
        app.add_event::<NodeReady>()
            .add_systems(Update, on_node_ready);
        let view = app.world.spawn(MapViewBundle::new(10.0)).id();
        let other = app.world.spawn(MapViewBundle::new(10.0)).id();
        let node = app.world.spawn_empty().id();

        let mut events = app.world.resource_mut::<Events<NodeReady>>();
        events.send(NodeReady {
            node,
            key: TileKey::ROOT,
            map_view: Some(view),
        });
        events.send(NodeReady {
            node,
            key: TileKey::ROOT,
            map_view: None,
        });
        app.update();

        let mut map_view = app.world.get_mut::<MapView>(view).unwrap();
        assert_eq!(map_view.ready_tiles(), 1);
        assert!(map_view.take_lod_update_request());
        assert!(!map_view.take_lod_update_request());
        let mut other_view = app.world.get_mut::<MapView>(other).unwrap();
        assert!(!other_view.take_lod_update_request());
    }

    #[test]
    fn bundle_scales_the_view_in_the_map_plane() {
        let bundle = MapViewBundle::new(250.0);
        assert_eq!(
            bundle.spatial.transform.scale,
            Vec3::new(250.0, 1.0, 250.0)
        );
        assert_eq!(bundle.spatial.visibility, Visibility::Inherited);
    }
}
