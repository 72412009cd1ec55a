//! Geographic and Bearing Module
//!
//! Validated observer coordinates and great-circle bearing computations
//! on a spherical Earth model.

use std::fmt;

use crate::error::{QiblaError, Result};

// ===================== CONSTANTS =====================

/// Latitude of the Kaabah in degrees
pub const KAABAH_LAT: f64 = 21.4225;

/// Longitude of the Kaabah in degrees
pub const KAABAH_LON: f64 = 39.8262;

/// The Kaabah reference point.
pub const KAABAH: GeoPoint = GeoPoint { latitude: KAABAH_LAT, longitude: KAABAH_LON };

/// Practical polar circle threshold. Only a hint; the ephemeris provider
/// decides whether a day is polar.
pub const POLAR_CIRCLE_LAT: f64 = 66.5;

// ===================== TYPES =====================

/// A geodetic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point, rejecting coordinates outside the valid ranges.
    ///
    /// # Errors
    /// Returns `InvalidLocation` for latitude outside -90..=90, longitude
    /// outside -180..=180, or non-finite input.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(QiblaError::InvalidLocation { latitude, longitude });
        }
        Ok(Self { latitude, longitude })
    }

    /// Initial great-circle bearing from `self` toward `to`, in [0, 360).
    pub fn bearing_to(&self, to: &GeoPoint) -> f64 {
        initial_bearing(self, to)
    }

    /// Bearing toward the Kaabah.
    pub fn qibla_bearing(&self) -> f64 {
        self.bearing_to(&KAABAH)
    }

    /// True when the point lies at or beyond the practical polar circle.
    pub fn is_polar_region(&self) -> bool {
        self.latitude.abs() >= POLAR_CIRCLE_LAT
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lat={:.6}, lon={:.6}", self.latitude, self.longitude)
    }
}

// ===================== BEARING FUNCTIONS =====================

/// Initial bearing (forward azimuth) from `from` to `to`.
///
/// ```text
/// θ = atan2(sin Δλ · cos φ2, cos φ1 · sin φ2 − sin φ1 · cos φ2 · cos Δλ)
/// ```
///
/// # Returns
/// Bearing in degrees clockwise from true north, in [0, 360)
pub fn initial_bearing(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let x = dlon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    normalize_0_360(x.atan2(y).to_degrees())
}

/// The opposite bearing, `(bearing + 180) mod 360`.
pub fn antipode(bearing: f64) -> f64 {
    normalize_0_360(bearing + 180.0)
}

/// Wrap an angle into [0, 360).
pub fn normalize_0_360(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if d >= 360.0 { 0.0 } else { d }
}

/// Wrap an angle into (-180, 180].
pub fn normalize_pm180(deg: f64) -> f64 {
    let d = normalize_0_360(deg);
    if d > 180.0 { d - 360.0 } else { d }
}

/// Signed difference `azimuth - target`, wrapped into (-180, 180].
pub fn azimuth_difference(azimuth: f64, target: f64) -> f64 {
    normalize_pm180(azimuth - target)
}

// ===================== TESTS =====================
