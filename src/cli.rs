//! Command-Line Interface Module
//!
//! Handles argument parsing and validation for the qibla-shadow application.
//! Every search and atmosphere flag is optional so the config file (or the
//! built-in default) applies when it is absent.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::config::Config;

// ===================== CLI =====================

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Observer latitude in decimal degrees (-90 to 90)
    #[arg(long, allow_hyphen_values = true, value_parser = parse_latitude, env = "QIBLA_SHADOW_LATITUDE",
          required_unless_present = "show_build_info")]
    pub latitude: Option<f64>,
    /// Observer longitude in decimal degrees (-180 to 180)
    #[arg(long, allow_hyphen_values = true, value_parser = parse_longitude, env = "QIBLA_SHADOW_LONGITUDE",
          required_unless_present = "show_build_info")]
    pub longitude: Option<f64>,
    /// Time zone to use ("location", "system", "utc", or IANA time zone name)
    #[arg(long, env = "QIBLA_SHADOW_TIMEZONE")]
    pub timezone: Option<String>,
    /// Use UTC time zone (takes precedence over --timezone)
    #[arg(long)]
    pub utc: bool,

    /// Date for calculations (e.g., "2025-06-21", "today", "tomorrow"); defaults to today
    #[arg(long)]
    pub date: Option<String>,

    /// TOML configuration file
    #[arg(long, env = "QIBLA_SHADOW_CONFIG")]
    pub config: Option<PathBuf>,

    // ===================== SEARCH OPTIONS =====================
    /// Sampling step in seconds for the coarse scan
    #[arg(long, env = "QIBLA_SHADOW_STEP_SECONDS")]
    pub step_seconds: Option<u32>,
    /// Largest accepted azimuth residual in degrees
    #[arg(long, value_parser = parse_positive_f64, env = "QIBLA_SHADOW_TOLERANCE")]
    pub tolerance: Option<f64>,
    /// Iteration cap for refining each alignment
    #[arg(long, env = "QIBLA_SHADOW_MAX_ITERATIONS")]
    pub max_iterations: Option<u32>,

    // ===================== OBSERVER / ATMOSPHERE =====================
    /// Observer elevation above mean sea level (meters, may be negative)
    /// Valid range: -500m (Dead Sea) to 11000m
    #[arg(long, allow_hyphen_values = true, value_parser = parse_elevation, env = "QIBLA_SHADOW_ELEVATION")]
    pub elevation: Option<f64>,
    /// Atmospheric pressure in hPa for refraction correction
    #[arg(long, value_parser = parse_positive_f64)]
    pub pressure: Option<f64>,
    /// Ambient temperature in °C for refraction correction
    #[arg(long, allow_hyphen_values = true)]
    pub temperature: Option<f64>,
    /// Use geometric sun positions without atmospheric refraction
    #[arg(long)]
    pub no_refraction: bool,

    // ===================== OUTPUT =====================
    /// Also print the sun path, one row every N minutes
    #[arg(long, value_name = "MINUTES", value_parser = parse_path_interval)]
    pub path: Option<u32>,
    /// Log search details to stderr (overridden by RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,

    /// Show build info from Cargo.lock at time of building
    #[arg(long)]
    pub show_build_info: bool,
}

impl Args {
    /// Layer explicit flags and environment values over `config`.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(step) = self.step_seconds {
            config.search.step_seconds = step;
        }
        if let Some(tol) = self.tolerance {
            config.search.tolerance_deg = tol;
        }
        if let Some(iters) = self.max_iterations {
            config.search.max_iterations = iters;
        }
        if let Some(elevation) = self.elevation {
            config.observer.elevation_m = elevation;
        }
        if let Some(pressure) = self.pressure {
            config.atmosphere.pressure_hpa = pressure;
        }
        if let Some(temperature) = self.temperature {
            config.atmosphere.temperature_c = temperature;
        }
        if self.no_refraction {
            config.atmosphere.refraction = false;
        }
        if self.utc {
            config.timezone.zone = "utc".to_string();
        } else if let Some(zone) = &self.timezone {
            config.timezone.zone = zone.clone();
        }
    }
}

// Define the structure to match what we serialized in build.rs
#[derive(Debug, Deserialize)]
pub struct DepInfo {
    pub name: String,
    pub version: String,
    pub checksum: Option<String>,
    pub source: Option<String>,
}

// ===================== CLI VALUE PARSERS =====================

fn parse_latitude(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(-90.0..=90.0).contains(&v) {
        return Err(format!("Latitude must be between -90 and 90, got {}", v));
    }
    Ok(v)
}

fn parse_longitude(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(-180.0..=180.0).contains(&v) {
        return Err(format!("Longitude must be between -180 and 180, got {}", v));
    }
    Ok(v)
}

fn parse_elevation(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(-500.0..=11000.0).contains(&v) {
        return Err(format!("Elevation must be between -500 and 11000 meters, got {}", v));
    }
    Ok(v)
}

fn parse_positive_f64(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if v.is_nan() || v <= 0.0 {
        return Err(format!("Value must be positive, got {}", v));
    }
    Ok(v)
}

fn parse_path_interval(s: &str) -> Result<u32, String> {
    let v: u32 = s.parse().map_err(|_| format!("Invalid integer: {}", s))?;
    if !(1..=720).contains(&v) {
        return Err(format!("Path interval must be between 1 and 720 minutes, got {}", v));
    }
    Ok(v)
}

// ===================== TESTS =====================
