use bevy::math::{DVec2, UVec2};

/// Position a node occupies inside its parent.
///
/// `Root` is reserved for the single level-0 node; every other node is one of
/// the four children of its parent. Rows grow downward, so `Top*` quadrants
/// have the smaller tile row.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Quadrant {
    Root,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    /// The four child quadrants, in the order children are stored.
    pub const CHILDREN: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    pub fn is_root(self) -> bool {
        self == Quadrant::Root
    }

    /// Slot of this quadrant in a child array, `None` for the root.
    pub fn index(self) -> Option<usize> {
        match self {
            Quadrant::Root => None,
            Quadrant::TopLeft => Some(0),
            Quadrant::TopRight => Some(1),
            Quadrant::BottomLeft => Some(2),
            Quadrant::BottomRight => Some(3),
        }
    }

    /// Column and row added to twice the parent's coordinate.
    pub fn grid_offset(self) -> Option<UVec2> {
        match self {
            Quadrant::Root => None,
            Quadrant::TopLeft => Some(UVec2::new(0, 0)),
            Quadrant::TopRight => Some(UVec2::new(1, 0)),
            Quadrant::BottomLeft => Some(UVec2::new(0, 1)),
            Quadrant::BottomRight => Some(UVec2::new(1, 1)),
        }
    }

    pub fn from_grid_offset(dx: u32, dy: u32) -> Option<Quadrant> {
        match (dx, dy) {
            (0, 0) => Some(Quadrant::TopLeft),
            (1, 0) => Some(Quadrant::TopRight),
            (0, 1) => Some(Quadrant::BottomLeft),
            (1, 1) => Some(Quadrant::BottomRight),
            _ => None,
        }
    }
}

/// Placement of a node inside its parent, in parent-local units where the
/// parent spans `[-0.5, 0.5]` on both axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    pub offset: DVec2,
    pub scale: DVec2,
}

impl LocalTransform {
    pub const ROOT: LocalTransform = LocalTransform {
        offset: DVec2::ZERO,
        scale: DVec2::ONE,
    };

    pub const CHILD_SCALE: DVec2 = DVec2::new(0.5, 0.5);

    pub fn for_quadrant(quadrant: Quadrant) -> Self {
        let offset = match quadrant {
            Quadrant::Root => return Self::ROOT,
            Quadrant::TopLeft => DVec2::new(-0.25, -0.25),
            Quadrant::TopRight => DVec2::new(0.25, -0.25),
            Quadrant::BottomLeft => DVec2::new(-0.25, 0.25),
            Quadrant::BottomRight => DVec2::new(0.25, 0.25),
        };
        Self {
            offset,
            scale: Self::CHILD_SCALE,
        }
    }
}
