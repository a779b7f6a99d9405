//! Geodesic primitives: angle normalization, bearings, distances.
//!
//! All functions are pure. Non-finite inputs propagate as NaN; callers
//! validate coordinates before use.

use crate::models::GeoPoint;

/// Mean Earth radius used for haversine distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_angle(deg: f64) -> f64 {
    let normalized = deg.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs due to rounding.
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Smallest absolute difference between two compass angles, in `[0, 180]`.
pub fn angular_difference(a_deg: f64, b_deg: f64) -> f64 {
    let diff = normalize_angle(a_deg - b_deg);
    diff.min(360.0 - diff)
}

/// Initial great-circle bearing from `from` to `to`, in degrees `[0, 360)`.
///
/// The bearing of a point to itself is 0 (the `atan2(0, 0)` convention).
pub fn bearing(from: GeoPoint, to: GeoPoint) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let delta_lambda = (to.longitude - from.longitude).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    normalize_angle(y.atan2(x).to_degrees())
}

/// Great-circle distance in meters using the haversine formula.
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let dphi = (b.latitude - a.latitude).to_radians();
    let dlambda = (b.longitude - a.longitude).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Convert a north/south offset in meters to degrees latitude.
pub fn meters_to_lat(meters: f64, ref_lat_deg: f64) -> f64 {
    meters / meters_per_deg_lat(ref_lat_deg).max(1e-9)
}

/// Convert an east/west offset in meters to degrees longitude.
///
/// Longitude degrees shrink toward the poles; the scale is floored at one
/// meter per degree so polar queries stay finite.
pub fn meters_to_lon(meters: f64, ref_lat_deg: f64) -> f64 {
    meters / meters_per_deg_lon(ref_lat_deg).max(1.0)
}

/// Midpoint of two nearby points by coordinate averaging.
pub fn midpoint(a: GeoPoint, b: GeoPoint) -> GeoPoint {
    GeoPoint::new(
        (a.latitude + b.latitude) / 2.0,
        (a.longitude + b.longitude) / 2.0,
    )
}

/// Offset a position by meters in the north and east directions.
pub fn offset_position(origin: GeoPoint, north_m: f64, east_m: f64) -> GeoPoint {
    GeoPoint::new(
        origin.latitude + meters_to_lat(north_m, origin.latitude),
        origin.longitude + meters_to_lon(east_m, origin.latitude),
    )
}
