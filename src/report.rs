//! Result Assembler Module
//!
//! Packages refined alignment events with local civil time and daylight
//! context, and runs the full per-day pipeline for one observer.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::info;

use crate::config::SearchConfig;
use crate::daylight::{DaylightStatus, DaylightWindow, resolve_daylight};
use crate::ephemeris::Ephemeris;
use crate::error::Result;
use crate::geo::{GeoPoint, antipode};
use crate::sampler::{Sampler, SolarSample};
use crate::search::{AlignmentEvent, AlignmentKind, TargetSearch, search_day};
use crate::time::{ResolvedZone, to_local};

/// One alignment, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentReport {
    pub kind: AlignmentKind,
    pub label: &'static str,
    pub bearing_deg: f64,
    pub instant_utc: DateTime<Utc>,
    pub instant_local: DateTime<FixedOffset>,
    pub zone_name: String,
    /// False when the local time is really UTC because no zone was found
    pub timezone_resolved: bool,
    pub azimuth_deg: f64,
    pub azimuth_error_deg: f64,
    pub altitude_deg: f64,
    pub daylight_status: DaylightStatus,
}

/// Everything computed for one (location, date) query.
#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    pub location: GeoPoint,
    pub date: NaiveDate,
    pub zone: ResolvedZone,
    pub qibla_bearing: f64,
    pub anti_bearing: f64,
    pub window: DaylightWindow,
    /// Per-target outcome, facing qibla first
    pub outcomes: Vec<TargetSearch>,
    /// All alignments, ordered by instant
    pub alignments: Vec<AlignmentReport>,
    /// Sun path over the civil day, above-horizon samples only
    pub path: Vec<SolarSample>,
}

/// Convert events to report records in `zone`.
///
/// An unresolved zone is already UTC; the records carry the flag instead of
/// being dropped.
pub fn assemble(
    events: &[AlignmentEvent],
    window: &DaylightWindow,
    zone: &ResolvedZone,
) -> Vec<AlignmentReport> {
    let mut reports: Vec<AlignmentReport> = events
        .iter()
        .map(|e| AlignmentReport {
            kind: e.kind,
            label: e.kind.label(),
            bearing_deg: e.target_bearing,
            instant_utc: e.instant,
            instant_local: to_local(e.instant, &zone.tz).fixed_offset(),
            zone_name: zone.tz.name().to_string(),
            timezone_resolved: zone.resolved,
            azimuth_deg: e.azimuth_deg,
            azimuth_error_deg: e.azimuth_error_deg,
            altitude_deg: e.altitude_deg,
            daylight_status: window.status,
        })
        .collect();
    reports.sort_by_key(|r| r.instant_utc);
    reports
}

/// Run daylight resolution, sampling, the alignment search and assembly for
/// one civil day.
///
/// # Errors
/// Ephemeris failures and dates that do not exist in the zone
pub fn build_day_report<E: Ephemeris + ?Sized>(
    ephemeris: &E,
    location: GeoPoint,
    date: NaiveDate,
    zone: ResolvedZone,
    config: &SearchConfig,
) -> Result<DayReport> {
    let qibla_bearing = location.qibla_bearing();
    let window = resolve_daylight(ephemeris, &location, date, &zone.tz)?;

    let sampler = Sampler::new(ephemeris, location);
    let day = search_day(&sampler, &window, qibla_bearing, config)?;
    let alignments = assemble(&day.events, &window, &zone);

    let path = if window.status == DaylightStatus::PolarNight {
        Vec::new()
    } else {
        let mut path = sampler.sample_range(window.day_start, window.day_end, config.step())?;
        path.retain(SolarSample::is_sun_up);
        path
    };

    info!(
        %location,
        %date,
        zone = zone.tz.name(),
        status = %window.status,
        alignments = alignments.len(),
        "day report assembled"
    );

    Ok(DayReport {
        location,
        date,
        zone,
        qibla_bearing,
        anti_bearing: antipode(qibla_bearing),
        window,
        outcomes: day.targets,
        alignments,
        path,
    })
}

// ===================== TESTS =====================
