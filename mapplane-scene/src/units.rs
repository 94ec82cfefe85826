use std::f64::consts::TAU;

/// WGS84 equatorial radius, in meters.
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Length of the equator, in meters. The flattened map is a square with this side.
pub const EARTH_PERIMETER: f64 = TAU * EARTH_RADIUS;
