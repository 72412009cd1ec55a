//! Daylight Window Module
//!
//! Classifies the civil day as normal, polar day or polar night and derives
//! the interval in which an alignment search makes sense.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use solar_positioning::SunriseResult;
use tracing::debug;

use crate::ephemeris::Ephemeris;
use crate::error::Result;
use crate::geo::GeoPoint;
use crate::time::civil_day_bounds;

// ===================== TYPES =====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaylightStatus {
    /// The sun rises and/or sets during the civil day
    Normal,
    /// The sun stays up all day (midnight sun)
    PolarDay,
    /// The sun never rises
    PolarNight,
}

impl fmt::Display for DaylightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "Normal",
            Self::PolarDay => "Polar Day (Midnight Sun)",
            Self::PolarNight => "Polar Night",
        };
        f.write_str(s)
    }
}

/// Daylight classification and search interval for one civil day.
///
/// `search_start < search_end` except for polar night, where both equal
/// `day_start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaylightWindow {
    pub status: DaylightStatus,
    /// Sunrise, when it falls inside the civil day
    pub sunrise: Option<DateTime<Utc>>,
    /// Sunset, when it falls inside the civil day
    pub sunset: Option<DateTime<Utc>>,
    /// Solar transit (highest sun) reported by the provider
    pub transit: DateTime<Utc>,
    pub search_start: DateTime<Utc>,
    pub search_end: DateTime<Utc>,
    /// Local 00:00 of the civil day, in UTC
    pub day_start: DateTime<Utc>,
    /// Local 00:00 of the following day, in UTC
    pub day_end: DateTime<Utc>,
}

impl DaylightWindow {
    pub fn is_empty(&self) -> bool {
        self.search_start >= self.search_end
    }

    /// True if `t` lies in `[search_start, search_end]`.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        !self.is_empty() && t >= self.search_start && t <= self.search_end
    }

    pub fn duration(&self) -> Duration {
        if self.is_empty() { Duration::zero() } else { self.search_end - self.search_start }
    }
}

// ===================== RESOLVER =====================

/// Resolve the daylight window for `date` (a civil day in `tz`) at `location`.
///
/// The provider's own polar classification is authoritative. On a normal
/// day a rise or set that falls outside the civil day is replaced by the
/// civil day boundary.
///
/// # Errors
/// Propagates ephemeris failures and `InvalidDate` for days that do not
/// exist in `tz`
pub fn resolve_daylight<E: Ephemeris + ?Sized>(
    ephemeris: &E,
    location: &GeoPoint,
    date: NaiveDate,
    tz: &Tz,
) -> Result<DaylightWindow> {
    let (day_start, day_end) = civil_day_bounds(date, tz)?;
    let result = ephemeris.sunrise_sunset(location, day_start.with_timezone(tz))?;

    let in_day = |t: DateTime<Utc>| t >= day_start && t < day_end;

    let window = match result {
        SunriseResult::RegularDay { sunrise, transit, sunset } => {
            let sunrise = Some(sunrise.with_timezone(&Utc)).filter(|t| in_day(*t));
            let sunset = Some(sunset.with_timezone(&Utc)).filter(|t| in_day(*t));

            let mut start = sunrise.unwrap_or(day_start);
            let mut end = sunset.unwrap_or(day_end);

            // Sunset before sunrise: daylight at both ends of the civil day
            if start >= end {
                debug!(%date, "sunset precedes sunrise within the civil day, searching the whole day");
                start = day_start;
                end = day_end;
            }

            DaylightWindow {
                status: DaylightStatus::Normal,
                sunrise,
                sunset,
                transit: transit.with_timezone(&Utc),
                search_start: start,
                search_end: end,
                day_start,
                day_end,
            }
        }
        SunriseResult::AllDay { transit } => DaylightWindow {
            status: DaylightStatus::PolarDay,
            sunrise: None,
            sunset: None,
            transit: transit.with_timezone(&Utc),
            search_start: day_start,
            search_end: day_end,
            day_start,
            day_end,
        },
        SunriseResult::AllNight { transit } => DaylightWindow {
            status: DaylightStatus::PolarNight,
            sunrise: None,
            sunset: None,
            transit: transit.with_timezone(&Utc),
            search_start: day_start,
            search_end: day_start,
            day_start,
            day_end,
        },
    };

    debug!(
        %date,
        status = %window.status,
        start = %window.search_start,
        end = %window.search_end,
        polar_hint = location.is_polar_region(),
        "daylight window resolved"
    );
    Ok(window)
}

// ===================== TESTS =====================
