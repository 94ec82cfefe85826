use bevy::prelude::*;
use mapplane_scene::TileGeometry;

/// The one mesh every plane tile renders, a unit quad in the XZ plane.
#[derive(Resource, Clone, Debug)]
pub struct TileMesh(pub Handle<Mesh>);

pub fn setup_tile_mesh(mut commands: Commands, meshes: Option<ResMut<Assets<Mesh>>>) {
    let Some(mut meshes) = meshes else {
        bevy::log::warn!("mesh assets are unavailable, tiles will have no geometry");
        return;
    };
    let mesh = meshes.add(Mesh::from(shape::Plane::from_size(TileGeometry::SIZE as f32)));
    commands.insert_resource(TileMesh(mesh));
}
