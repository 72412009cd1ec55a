//! Configuration loading from TOML files
//!
//! Layering, lowest first:
//! 1. Built-in defaults
//! 2. TOML file given by --config <path> (or QIBLA_SHADOW_CONFIG)
//! 3. Individual command-line flags / QIBLA_SHADOW_* environment variables

use std::fs;
use std::path::Path;

use chrono::Duration;
use serde::Deserialize;
use tracing::debug;

use crate::error::{QiblaError, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Sampling granularity in seconds
    pub step_seconds: u32,
    /// Largest accepted |azimuth - bearing| at a refined alignment, degrees
    pub tolerance_deg: f64,
    /// Root-finder iteration cap per candidate
    pub max_iterations: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { step_seconds: 60, tolerance_deg: 0.001, max_iterations: 60 }
    }
}

impl SearchConfig {
    pub fn step(&self) -> Duration {
        Duration::seconds(i64::from(self.step_seconds))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Height above mean sea level in meters
    pub elevation_m: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AtmosphereConfig {
    pub refraction: bool,
    pub pressure_hpa: f64,
    pub temperature_c: f64,
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self { refraction: true, pressure_hpa: 1013.25, temperature_c: 15.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimezoneConfig {
    /// "location", "system", "utc" or an IANA zone name
    pub zone: String,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self { zone: "location".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub observer: ObserverConfig,
    pub atmosphere: AtmosphereConfig,
    pub timezone: TimezoneConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| QiblaError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load from `path` when given, otherwise use the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Check ranges after all layers have been applied.
    pub fn validate(&self) -> Result<()> {
        let s = &self.search;
        if !(1..=3600).contains(&s.step_seconds) {
            return Err(QiblaError::Config(format!(
                "search.step_seconds must be between 1 and 3600, got {}",
                s.step_seconds
            )));
        }
        if !(s.tolerance_deg > 0.0 && s.tolerance_deg <= 1.0) {
            return Err(QiblaError::Config(format!(
                "search.tolerance_deg must be in (0, 1], got {}",
                s.tolerance_deg
            )));
        }
        if !(1..=200).contains(&s.max_iterations) {
            return Err(QiblaError::Config(format!(
                "search.max_iterations must be between 1 and 200, got {}",
                s.max_iterations
            )));
        }
        if !(-500.0..=11000.0).contains(&self.observer.elevation_m) {
            return Err(QiblaError::Config(format!(
                "observer.elevation_m must be between -500 and 11000 meters, got {}",
                self.observer.elevation_m
            )));
        }
        let a = &self.atmosphere;
        if a.pressure_hpa <= 0.0 {
            return Err(QiblaError::Config(format!(
                "atmosphere.pressure_hpa must be positive, got {}",
                a.pressure_hpa
            )));
        }
        if a.temperature_c <= -273.15 {
            return Err(QiblaError::Config(format!(
                "atmosphere.temperature_c must be above absolute zero, got {}",
                a.temperature_c
            )));
        }
        Ok(())
    }
}

// ===================== TESTS =====================
