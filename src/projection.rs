/// Spherical web-mercator transforms
///
/// Forward and inverse projection between WGS84 degrees and the projected plane
/// in meters. Latitude is not clamped; callers keep it inside ±85° (see
/// `GeoPoint::is_projectable`).

use crate::constants::EARTH_RADIUS_M;
use glam::DVec2;
use std::f64::consts::FRAC_PI_4;

/// Project longitude/latitude degrees onto the mercator plane (meters)
///
/// # Examples
/// ```
/// use hex_presence::projection::to_plane;
///
/// let origin = to_plane(0.0, 0.0);
/// assert_eq!(origin.x, 0.0);
/// assert!(origin.y.abs() < 1e-9);
/// ```
pub fn to_plane(lon: f64, lat: f64) -> DVec2 {
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    DVec2::new(x, y)
}

/// Inverse of [`to_plane`]: returns `(lon, lat)` in degrees
pub fn to_sphere(plane: DVec2) -> (f64, f64) {
    let lon = (plane.x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (plane.y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    (lon, lat)
}
