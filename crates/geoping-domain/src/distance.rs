//! Great-circle distance between coordinates

use crate::Coordinate;

/// Mean Earth radius used by the haversine formula (meters)
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine great-circle distance between two coordinates, in meters
///
/// The result is always `>= 0`, symmetric in its arguments, and zero when
/// both coordinates are equal. Inputs are not range-checked.
///
/// # Examples
///
/// ```
/// use geoping_domain::{haversine_distance, Coordinate};
///
/// let a = Coordinate::new(51.5, -0.12).unwrap();
/// let b = Coordinate::new(51.501, -0.12).unwrap();
///
/// let d = haversine_distance(&a, &b);
/// assert!((d - 111.19).abs() < 0.1);
/// assert_eq!(d, haversine_distance(&b, &a));
/// ```
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    // abs() keeps the terms bit-identical when the arguments are swapped
    let d_lat = (b.latitude - a.latitude).abs().to_radians();
    let d_lon = (b.longitude - a.longitude).abs().to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude_radians().cos() * b.latitude_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}
