use bevy::math::DVec3;

/// Plane in Hessian normal form: `normal . p + distance = 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub distance: f64,
}
impl Plane {
    pub fn from_point_normal(point: &DVec3, normal: &DVec3) -> Self {
        let distance = -normal.dot(*point);
        Self {
            normal: *normal,
            distance,
        }
    }
    pub fn get_point_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) + self.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_distance_from_point_normal() {
        let plane = Plane::from_point_normal(&DVec3::new(0.0, 2.0, 0.0), &DVec3::Y);
        assert_eq!(plane.get_point_distance(DVec3::new(5.0, 3.0, -1.0)), 1.0);
        assert_eq!(plane.get_point_distance(DVec3::ZERO), -2.0);
    }
}
