use bevy::prelude::*;
use mapplane_scene::{LocalTransform, Quadrant, TileKey};

use super::factory::NodeFactory;

/// Load progress of a node. `Ready` is terminal.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum NodeLoadState {
    #[default]
    Unloaded,
    Loading,
    Ready,
}

/// One tile of the map quadtree.
///
/// The entity also carries a `Transform` derived from `local_transform` and a
/// `Visibility` that stays `Hidden` until the node is `Ready`.
#[derive(Component, Debug, Clone)]
pub struct QuadtreeNode {
    key: TileKey,
    quadrant: Quadrant,
    parent: Option<Entity>,
    map_view: Option<Entity>,
    children: Option<[Entity; 4]>,
    local_transform: LocalTransform,
}

impl QuadtreeNode {
    pub(crate) fn new(
        key: TileKey,
        quadrant: Quadrant,
        parent: Option<Entity>,
        map_view: Option<Entity>,
    ) -> Self {
        Self {
            key,
            quadrant,
            parent,
            map_view,
            children: None,
            local_transform: LocalTransform::for_quadrant(quadrant),
        }
    }

    pub fn key(&self) -> TileKey {
        self.key
    }

    pub fn quadrant(&self) -> Quadrant {
        self.quadrant
    }

    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    /// The map view this node's tree hangs from, if it was spawned under one.
    pub fn map_view(&self) -> Option<Entity> {
        self.map_view
    }

    pub fn local_transform(&self) -> LocalTransform {
        self.local_transform
    }

    /// All four children ordered like [`Quadrant::CHILDREN`], or `None` for a leaf.
    pub fn children(&self) -> Option<[Entity; 4]> {
        self.children
    }

    pub fn child(&self, quadrant: Quadrant) -> Option<Entity> {
        let index = quadrant.index()?;
        self.children.and_then(|children| children.get(index).copied())
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub(crate) fn set_children(&mut self, children: [Entity; 4]) {
        self.children = Some(children);
    }

    pub(crate) fn take_children(&mut self) -> Option<[Entity; 4]> {
        self.children.take()
    }

    /// Scene-graph transform of the node. The map lies in the XZ plane, so the
    /// 2D offset maps to X/Z and height is left untouched.
    pub fn transform(&self) -> Transform {
        let LocalTransform { offset, scale } = self.local_transform;
        Transform::from_xyz(offset.x as f32, 0.0, offset.y as f32).with_scale(Vec3::new(
            scale.x as f32,
            1.0,
            scale.y as f32,
        ))
    }
}

pub fn is_visible(visibility: &Visibility) -> bool {
    matches!(visibility, Visibility::Visible)
}

#[derive(Bundle)]
pub struct QuadtreeNodeBundle {
    pub node: QuadtreeNode,
    pub key: TileKey,
    pub state: NodeLoadState,
    pub factory: NodeFactory,
    pub spatial: SpatialBundle,
}

impl QuadtreeNodeBundle {
    pub fn new(node: QuadtreeNode, factory: NodeFactory) -> Self {
        let transform = node.transform();
        Self {
            key: node.key(),
            node,
            state: NodeLoadState::Unloaded,
            factory,
            spatial: SpatialBundle {
                visibility: Visibility::Hidden,
                transform,
                ..Default::default()
            },
        }
    }
}
