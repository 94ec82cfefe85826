#![warn(
    clippy::unwrap_used,
    clippy::cast_lossless,
    clippy::unimplemented,
    clippy::indexing_slicing,
    clippy::expect_used
)]

use bevy::prelude::*;

pub mod datasource;
mod error;
pub mod map_view;
pub mod quadtree;
mod settings;
mod tile_mesh;

pub use error::QuadtreeError;
pub use settings::MapPlaneSettings;
pub use tile_mesh::TileMesh;

use datasource::{handle_fetch_tile_jobs, ActiveTileDataSource, ImmediateDataSource, TileLoadChannel};
use map_view::on_node_ready;
use quadtree::{apply_completed_loads, NodeReady};

/// Map plane quadtree: tile mesh, load completion delivery and map view
/// bookkeeping. Install a data source with [`ActiveTileDataSource`] before
/// adding the plugin to load real tiles; otherwise every tile completes on
/// the spot.
pub struct MapPlanePlugin;

impl bevy::app::Plugin for MapPlanePlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<mapplane_jobs::Plugin>() {
            app.add_plugins(mapplane_jobs::Plugin);
        }
        if !app.world.contains_resource::<ActiveTileDataSource>() {
            app.insert_resource(ActiveTileDataSource::new(ImmediateDataSource));
        }
        app.init_resource::<MapPlaneSettings>()
            .init_resource::<TileLoadChannel>()
            .add_event::<NodeReady>()
            .add_systems(PreStartup, tile_mesh::setup_tile_mesh)
            .add_systems(
                PreUpdate,
                (handle_fetch_tile_jobs, apply_completed_loads)
                    .chain()
                    .after(mapplane_jobs::check_system),
            )
            .add_systems(Update, on_node_ready);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        map_view::{MapView, MapViewBundle},
        quadtree::{NodeFactory, NodeLoadState, QuadtreeCommandsExt, QuadtreeNode},
    };

    fn start_map(mut commands: Commands) {
        let view = commands.spawn(MapViewBundle::new(100.0)).id();
        commands.spawn_root_node(view, NodeFactory::default());
    }

    #[test]
    fn plugin_loads_the_root_with_the_default_source() {
        let mut app = App::new();
        app.add_plugins(MapPlanePlugin).add_systems(Startup, start_map);
        app.update();
        app.update();

        let mut nodes = app.world.query::<(&QuadtreeNode, &NodeLoadState, &Visibility)>();
        let loaded: Vec<_> = nodes
            .iter(&app.world)
            .map(|(node, state, visibility)| (node.key(), *state, *visibility))
            .collect();
        assert_eq!(
            loaded,
            vec![(
                mapplane_scene::TileKey::ROOT,
                NodeLoadState::Ready,
                Visibility::Visible
            )]
        );
        let mut views = app.world.query::<&MapView>();
        assert_eq!(views.single(&app.world).ready_tiles(), 1);
    }
}
