//! Error Types Module
//!
//! Hard failures only. "No alignment today" and "polar night" are ordinary
//! search outcomes and never show up here.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QiblaError>;

#[derive(Debug, Error)]
pub enum QiblaError {
    /// Coordinates outside the valid geodetic range; rejected before any computation.
    #[error("invalid location lat={latitude}, lon={longitude} (latitude must be -90..=90, longitude -180..=180)")]
    InvalidLocation { latitude: f64, longitude: f64 },

    /// The ephemeris provider could not produce a position or rise/set result.
    #[error("ephemeris unavailable: {0}")]
    Ephemeris(#[from] solar_positioning::Error),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
