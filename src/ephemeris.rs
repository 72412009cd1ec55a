//! Ephemeris Provider Module
//!
//! The seam between the alignment search and the astronomy. The search only
//! sees the [`Ephemeris`] trait; [`SpaEphemeris`] backs it with the NREL SPA
//! (Solar Position Algorithm) from `solar_positioning`.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use solar_positioning::{Horizon, RefractionCorrection, SunriseResult, spa, time::DeltaT};
use tracing::debug;

use crate::config::AtmosphereConfig;
use crate::error::Result;
use crate::geo::GeoPoint;

// ===================== TYPES =====================

/// Topocentric sun direction in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunPosition {
    /// Degrees clockwise from true north, [0, 360)
    pub azimuth: f64,
    /// Degrees above the horizon, [-90, 90]
    pub altitude: f64,
}

/// Source of sun positions and rise/set results.
pub trait Ephemeris {
    /// Sun position seen from `location` at `instant`.
    fn position_at(&self, location: &GeoPoint, instant: DateTime<Utc>) -> Result<SunPosition>;

    /// Sunrise, transit and sunset for the civil day starting at `day_start`.
    ///
    /// Polar days and nights come back as `AllDay` / `AllNight`.
    fn sunrise_sunset(
        &self,
        location: &GeoPoint,
        day_start: DateTime<Tz>,
    ) -> Result<SunriseResult<DateTime<Tz>>>;
}

// ===================== SPA PROVIDER =====================

/// SPA-backed ephemeris for one query date.
///
/// SPA is analytic; delta-T is estimated once for the query month and there
/// is no data file to load or cache.
#[derive(Debug, Clone, Copy)]
pub struct SpaEphemeris {
    /// Observer elevation above sea level in meters
    pub elevation_m: f64,
    /// Delta-T correction for TT-UT1 difference (seconds)
    pub delta_t: f64,
    /// Atmospheric refraction correction, `None` for geometric positions
    pub refraction: Option<RefractionCorrection>,
}

impl SpaEphemeris {
    /// Build a provider for `date` with the given atmosphere settings.
    ///
    /// # Errors
    /// Returns `Ephemeris` if delta-T cannot be estimated for the date or the
    /// pressure/temperature pair is rejected
    pub fn for_date(date: NaiveDate, elevation_m: f64, atmosphere: &AtmosphereConfig) -> Result<Self> {
        let delta_t = DeltaT::estimate_from_date(date.year(), date.month())?;
        let refraction = if atmosphere.refraction {
            Some(RefractionCorrection::new(atmosphere.pressure_hpa, atmosphere.temperature_c)?)
        } else {
            None
        };
        debug!(%date, delta_t, refraction = atmosphere.refraction, "SPA ephemeris ready");
        Ok(Self { elevation_m, delta_t, refraction })
    }
}

impl Ephemeris for SpaEphemeris {
    fn position_at(&self, location: &GeoPoint, instant: DateTime<Utc>) -> Result<SunPosition> {
        let pos = spa::solar_position(
            instant,
            location.latitude,
            location.longitude,
            self.elevation_m,
            self.delta_t,
            self.refraction,
        )?;
        Ok(SunPosition { azimuth: pos.azimuth(), altitude: pos.elevation_angle() })
    }

    fn sunrise_sunset(
        &self,
        location: &GeoPoint,
        day_start: DateTime<Tz>,
    ) -> Result<SunriseResult<DateTime<Tz>>> {
        Ok(spa::sunrise_sunset_for_horizon(
            day_start,
            location.latitude,
            location.longitude,
            self.delta_t,
            Horizon::SunriseSunset,
        )?)
    }
}

// ===================== TESTS =====================
