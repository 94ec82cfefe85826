//! Flat map demo: a single quadtree refined by camera distance.
//!
//! WASD pans, Q/E move the camera up and down, left click reports the tile
//! under the cursor. Set `MAPPLANE_TILE_URL` to an `{z}/{x}/{y}` template to
//! fetch real tiles.

use bevy::{prelude::*, window::PrimaryWindow};
use mapplane_renderer::{
    datasource::{ActiveTileDataSource, XyzDataSource},
    map_view::{MapView, MapViewBundle},
    quadtree::{
        NodeFactory, NodeLoadState, NodeReady, QuadtreeCommandsExt, QuadtreeNode, TileRaycast,
    },
    MapPlanePlugin, MapPlaneSettings,
};

/// Subdivide when a tile is larger than this share of its camera distance.
const SPLIT_RATIO: f32 = 1.0;
/// Collapse once all children fall below this share.
const MERGE_RATIO: f32 = 0.5;
const CAMERA_SPEED: f32 = 0.8;

fn main() {
    let mut app = App::new();
    if let Ok(url_template) = std::env::var("MAPPLANE_TILE_URL") {
        app.insert_resource(ActiveTileDataSource::new(XyzDataSource::new(url_template)));
    }
    app.insert_resource(MapPlaneSettings {
        world_scale: 100.0,
        maximum_level: 12,
    })
    .add_plugins(DefaultPlugins)
    .add_plugins(MapPlanePlugin)
    .add_systems(Startup, setup)
    .add_systems(
        Update,
        (
            move_camera,
            update_level_of_detail,
            hide_covered_parents,
            pick_tile,
        ),
    )
    .run();
}

fn setup(mut commands: Commands, settings: Res<MapPlaneSettings>) {
    let view = commands.spawn(MapViewBundle::new(settings.world_scale)).id();
    commands.spawn_root_node(view, NodeFactory::default());

    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: 20000.0,
            ..default()
        },
        transform: Transform::from_xyz(0.0, 1.0, 0.0).looking_at(Vec3::new(0.3, 0.0, 0.2), Vec3::Y),
        ..default()
    });
    let height = settings.world_scale;
    commands.spawn(Camera3dBundle {
        transform: Transform::from_xyz(0.0, height, height * 0.5).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });
}

fn move_camera(
    time: Res<Time>,
    keys: Res<Input<KeyCode>>,
    mut cameras: Query<&mut Transform, With<Camera>>,
) {
    let mut direction = Vec3::ZERO;
    if keys.pressed(KeyCode::W) {
        direction.z -= 1.0;
    }
    if keys.pressed(KeyCode::S) {
        direction.z += 1.0;
    }
    if keys.pressed(KeyCode::A) {
        direction.x -= 1.0;
    }
    if keys.pressed(KeyCode::D) {
        direction.x += 1.0;
    }
    if keys.pressed(KeyCode::Q) {
        direction.y -= 1.0;
    }
    if keys.pressed(KeyCode::E) {
        direction.y += 1.0;
    }
    if direction == Vec3::ZERO {
        return;
    }
    for mut transform in &mut cameras {
        // speed follows height so the motion feels the same at every zoom
        let speed = transform.translation.y.max(0.01) * CAMERA_SPEED;
        transform.translation += direction.normalize() * speed * time.delta_seconds();
        transform.translation.y = transform.translation.y.max(0.01);
    }
}

fn tile_size(global_transform: &GlobalTransform) -> f32 {
    let (scale, _, _) = global_transform.to_scale_rotation_translation();
    scale.x.max(scale.z)
}

fn update_level_of_detail(
    mut commands: Commands,
    settings: Res<MapPlaneSettings>,
    cameras: Query<&GlobalTransform, With<Camera>>,
    nodes: Query<(Entity, &QuadtreeNode, &NodeLoadState, &GlobalTransform)>,
    mut visibilities: Query<&mut Visibility, With<QuadtreeNode>>,
) {
    let Ok(camera) = cameras.get_single() else {
        return;
    };
    let eye = camera.translation();
    let wants_detail = |global_transform: &GlobalTransform, ratio: f32| {
        let distance = eye.distance(global_transform.translation()).max(f32::EPSILON);
        tile_size(global_transform) / distance > ratio
    };

    for (entity, node, state, global_transform) in &nodes {
        match node.children() {
            None => {
                if *state == NodeLoadState::Ready
                    && node.key().level < settings.maximum_level
                    && wants_detail(global_transform, SPLIT_RATIO)
                {
                    commands.subdivide_node(entity);
                }
            }
            Some(children) => {
                let coarse = children.iter().all(|child| {
                    nodes
                        .get(*child)
                        .map_or(true, |(_, node, _, transform)| {
                            node.is_leaf() && !wants_detail(transform, MERGE_RATIO)
                        })
                });
                if coarse {
                    commands.collapse_node(entity);
                    if *state == NodeLoadState::Ready {
                        if let Ok(mut visibility) = visibilities.get_mut(entity) {
                            *visibility = Visibility::Visible;
                        }
                    }
                }
            }
        }
    }
}

/// Once all four children of a tile show content, the parent is hidden so
/// tiles of two levels never overlap on screen.
fn hide_covered_parents(
    mut events: EventReader<NodeReady>,
    nodes: Query<(&QuadtreeNode, &NodeLoadState)>,
    mut visibilities: Query<&mut Visibility, With<QuadtreeNode>>,
    mut views: Query<&mut MapView>,
) {
    for event in events.iter() {
        let Some(parent) = nodes.get(event.node).ok().and_then(|(node, _)| node.parent()) else {
            continue;
        };
        let Some(children) = nodes.get(parent).ok().and_then(|(node, _)| node.children()) else {
            continue;
        };
        let covered = children.iter().all(|child| {
            matches!(nodes.get(*child), Ok((_, NodeLoadState::Ready)))
        });
        if covered {
            if let Ok(mut visibility) = visibilities.get_mut(parent) {
                *visibility = Visibility::Hidden;
            }
        }
        if let Some(mut view) = event.map_view.and_then(|view| views.get_mut(view).ok()) {
            if view.take_lod_update_request() {
                debug!("{} tiles ready", view.ready_tiles());
            }
        }
    }
}

fn pick_tile(
    mouse: Res<Input<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform)>,
    raycast: TileRaycast,
) {
    if !mouse.just_pressed(MouseButton::Left) {
        return;
    }
    let Some(cursor) = windows.get_single().ok().and_then(|window| window.cursor_position()) else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.get_single() else {
        return;
    };
    let Some(ray) = camera.viewport_to_world(camera_transform, cursor) else {
        return;
    };
    match raycast.pick(&ray.into()) {
        Some(hit) => info!(
            "picked tile {} at ({:.3}, {:.3}), {:.2} away",
            hit.key, hit.point.x, hit.point.z, hit.distance
        ),
        None => info!("no visible tile under the cursor"),
    }
}
