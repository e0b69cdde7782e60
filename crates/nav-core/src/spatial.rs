//! Geodesy primitives: great-circle distance, bearings and coordinate checks.
//!
//! All functions are pure. Distances are in nautical miles and bearings are
//! true (not magnetic) in degrees.

use crate::error::{NavError, NavResult};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.065;
pub const FEET_PER_METER: f64 = 3.28084;

pub const MIN_ALTITUDE_FT: f64 = -1000.0;
pub const MAX_ALTITUDE_FT: f64 = 60000.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn distance_nm(&self, other: &GeoPoint) -> f64 {
        haversine_distance_nm(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Axis-aligned latitude/longitude box. Does not wrap the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat: min_lat.min(max_lat),
            min_lon: min_lon.min(max_lon),
            max_lat: min_lat.max(max_lat),
            max_lon: min_lon.max(max_lon),
        }
    }

    /// Box enclosing a circle of `radius_nm` around a center point.
    pub fn around(center: GeoPoint, radius_nm: f64) -> Self {
        let dlat = radius_nm / 60.0;
        let cos_lat = center.lat.to_radians().cos().abs().max(1e-6);
        let dlon = (radius_nm / (60.0 * cos_lat)).min(180.0);
        Self::new(
            (center.lat - dlat).max(-90.0),
            (center.lon - dlon).max(-180.0),
            (center.lat + dlat).min(90.0),
            (center.lon + dlon).min(180.0),
        )
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Great-circle distance between two points in nautical miles (haversine).
pub fn haversine_distance_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_NM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Calculate bearing from point 1 to point 2 in radians.
/// Returns bearing in radians, 0 = north, π/2 = east.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    x.atan2(y)
}

/// Initial true bearing from point 1 to point 2, in degrees within [0, 360).
pub fn initial_bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    normalize_heading(bearing(lat1, lon1, lat2, lon2).to_degrees())
}

/// Wrap any angle into [0, 360).
pub fn normalize_heading(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Smallest absolute angle between two headings, in [0, 180].
pub fn heading_difference(a_deg: f64, b_deg: f64) -> f64 {
    let diff = (a_deg - b_deg).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Point at `fraction` (0..=1) of the way along the great circle from 1 to 2.
pub fn intermediate_point(lat1: f64, lon1: f64, lat2: f64, lon2: f64, fraction: f64) -> (f64, f64) {
    let fraction = fraction.clamp(0.0, 1.0);
    let delta = haversine_distance_nm(lat1, lon1, lat2, lon2) / EARTH_RADIUS_NM;
    if delta.abs() < 1e-12 {
        return (lat1, lon1);
    }

    let phi1 = lat1.to_radians();
    let lambda1 = lon1.to_radians();
    let phi2 = lat2.to_radians();
    let lambda2 = lon2.to_radians();

    let a = ((1.0 - fraction) * delta).sin() / delta.sin();
    let b = (fraction * delta).sin() / delta.sin();
    let x = a * phi1.cos() * lambda1.cos() + b * phi2.cos() * lambda2.cos();
    let y = a * phi1.cos() * lambda1.sin() + b * phi2.cos() * lambda2.sin();
    let z = a * phi1.sin() + b * phi2.sin();

    let phi = z.atan2((x * x + y * y).sqrt());
    let lambda = y.atan2(x);
    (phi.to_degrees(), lambda.to_degrees())
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
    let meters_per_deg = meters_per_deg_lat(ref_lat_deg).max(1e-9);
    meters / meters_per_deg
}

/// Convert an east/west offset in meters to degrees longitude.
/// Requires the reference latitude for proper scaling.
pub fn meters_to_lon(meters: f64, ref_lat_deg: f64) -> f64 {
    let meters_per_deg = meters_per_deg_lon(ref_lat_deg).max(1e-9);
    meters / meters_per_deg
}

pub fn is_valid_latitude(lat: f64) -> bool {
    lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

pub fn is_valid_longitude(lon: f64) -> bool {
    lon.is_finite() && (-180.0..=180.0).contains(&lon)
}

pub fn is_valid_altitude_ft(altitude_ft: f64) -> bool {
    altitude_ft.is_finite() && (MIN_ALTITUDE_FT..=MAX_ALTITUDE_FT).contains(&altitude_ft)
}

/// Reject non-finite or out-of-range coordinates with `InvalidInput`.
pub fn validate_coordinates(lat: f64, lon: f64) -> NavResult<()> {
    if !is_valid_latitude(lat) {
        return Err(NavError::invalid_input(
            "latitude",
            format!("{lat} is not a finite value in [-90, 90]"),
        ));
    }
    if !is_valid_longitude(lon) {
        return Err(NavError::invalid_input(
            "longitude",
            format!("{lon} is not a finite value in [-180, 180]"),
        ));
    }
    Ok(())
}

pub fn validate_altitude_ft(altitude_ft: f64) -> NavResult<()> {
    if !is_valid_altitude_ft(altitude_ft) {
        return Err(NavError::invalid_input(
            "altitude",
            format!("{altitude_ft} ft is not a finite value in [{MIN_ALTITUDE_FT}, {MAX_ALTITUDE_FT}]"),
        ));
    }
    Ok(())
}
