//! Geographic coordinates and great-circle math.
//!
//! All coordinates are WGS84 latitude/longitude in degrees. The math
//! functions here assume valid input; range checks happen once, when a
//! `Coordinate` is constructed.

use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};

/// Earth radius in meters (spherical model).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A validated latitude/longitude pair.
///
/// Out-of-range or non-finite input is rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = NavError;

    fn try_from(raw: RawCoordinate) -> Result<Self> {
        Coordinate::new(raw.lat, raw.lon)
    }
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);

        if valid {
            Ok(Self { lat, lon })
        } else {
            Err(NavError::InvalidCoordinate {
                latitude: lat,
                longitude: lon,
            })
        }
    }

    /// Build a coordinate from a `[lon, lat]` pair as routing services
    /// send them. Note the axis order is the reverse of `new`.
    pub fn from_lon_lat(pair: [f64; 2]) -> Result<Self> {
        let [lon, lat] = pair;
        Self::new(lat, lon)
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

/// Haversine distance between two coordinates in meters.
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Initial bearing from `a` to `b` in degrees [0, 360).
///
/// Meaningless when `a == b`.
pub fn bearing(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    let bearing = y.atan2(x).to_degrees();
    (bearing + 360.0) % 360.0
}

/// Point reached by travelling `distance_m` from `origin` on the initial
/// bearing `bearing_deg` along a great circle.
pub fn destination(origin: &Coordinate, distance_m: f64, bearing_deg: f64) -> Coordinate {
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();
    let theta = bearing_deg.to_radians();
    let delta = distance_m / EARTH_RADIUS_M;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    // asin keeps lat2 in range; longitude wraps back into [-180, 180)
    Coordinate {
        lat: lat2.to_degrees().clamp(-90.0, 90.0),
        lon: (lon2.to_degrees() + 540.0) % 360.0 - 180.0,
    }
}

/// Total length of a path in meters.
pub fn path_length(points: &[Coordinate]) -> f64 {
    points.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}
