//! Time and Timezone Utilities Module
//!
//! Timezone resolution for an observer, civil-day boundaries, date parsing
//! and duration formatting.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_english::{Dialect, parse_date_string};
use chrono_tz::Tz;
use iana_time_zone::get_timezone;
use tracing::{debug, warn};
use tzf_rs::DefaultFinder;

use crate::error::{QiblaError, Result};
use crate::geo::GeoPoint;

// ===================== TIMEZONE LOOKUP =====================

/// Owned handle to the coordinate → timezone finder.
///
/// The tzf-rs dataset is decoded on first use and reused afterwards, so
/// calling [`TimezoneFinder::resolve`] repeatedly is cheap.
#[derive(Default)]
pub struct TimezoneFinder {
    finder: OnceLock<DefaultFinder>,
}

impl TimezoneFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the IANA timezone for a location.
    ///
    /// # Returns
    /// The zone, or `None` if the finder has no answer or the name is not a
    /// zone chrono-tz knows about
    pub fn resolve(&self, location: &GeoPoint) -> Option<Tz> {
        let finder = self.finder.get_or_init(DefaultFinder::new);
        // tzf-rs takes (lon, lat)
        let tzid = finder.get_tz_name(location.longitude, location.latitude);
        if tzid.is_empty() {
            return None;
        }
        tzid.parse::<Tz>().ok()
    }
}

/// Get the system's configured timezone, if it can be determined.
pub fn system_timezone() -> Option<Tz> {
    get_timezone().ok().and_then(|s| s.parse().ok())
}

// ===================== ZONE CHOICE =====================

/// How the civil timezone for a query is chosen.
///
/// Resolved once up front into a [`ResolvedZone`]; nothing downstream cares
/// how the zone was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneChoice {
    /// Look the zone up from the observer's coordinates
    Location,
    /// Use the host system's zone
    System,
    Utc,
    Named(Tz),
}

impl ZoneChoice {
    /// Parse "location", "system", "utc" or an IANA zone name.
    ///
    /// # Errors
    /// Returns `Config` for an unknown zone name
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "location" => Ok(Self::Location),
            "system" => Ok(Self::System),
            "utc" => Ok(Self::Utc),
            _ => s
                .trim()
                .parse::<Tz>()
                .map(Self::Named)
                .map_err(|_| QiblaError::Config(format!("unknown timezone '{}'", s))),
        }
    }
}

/// A concrete zone plus whether it was actually resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedZone {
    pub tz: Tz,
    /// False when lookup failed and UTC is being used as a stand-in
    pub resolved: bool,
}

impl ResolvedZone {
    pub fn utc_fallback() -> Self {
        Self { tz: Tz::UTC, resolved: false }
    }
}

/// Turn a [`ZoneChoice`] into a concrete zone for `location`.
///
/// Lookup failures fall back to UTC with `resolved = false`; they are never fatal.
pub fn resolve_zone(choice: ZoneChoice, location: &GeoPoint, finder: &TimezoneFinder) -> ResolvedZone {
    let found = match choice {
        ZoneChoice::Utc => Some(Tz::UTC),
        ZoneChoice::Named(tz) => Some(tz),
        ZoneChoice::System => system_timezone(),
        ZoneChoice::Location => finder.resolve(location),
    };
    match found {
        Some(tz) => {
            debug!(zone = %tz, ?choice, "timezone resolved");
            ResolvedZone { tz, resolved: true }
        }
        None => {
            warn!(?choice, %location, "timezone could not be resolved, falling back to UTC");
            ResolvedZone::utc_fallback()
        }
    }
}

// ===================== CIVIL DAY =====================

/// First valid instant of a local calendar day.
///
/// Midnight may not exist on DST-gap days; 01:00 is tried next. Ambiguous
/// times take the earlier instant.
fn start_of_day(date: NaiveDate, tz: &Tz) -> Option<DateTime<Tz>> {
    [0, 1]
        .into_iter()
        .filter_map(|h| date.and_hms_opt(h, 0, 0))
        .find_map(|naive| tz.from_local_datetime(&naive).earliest())
}

/// UTC bounds `[start, end)` of the civil day `date` in `tz`.
///
/// `end` is the start of the next existing local day, so skipped days
/// (e.g. Samoa, 2011-12-30) are stepped over.
///
/// # Errors
/// Returns `InvalidDate` if `date` itself does not exist in `tz`
pub fn civil_day_bounds(date: NaiveDate, tz: &Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = start_of_day(date, tz)
        .ok_or_else(|| QiblaError::InvalidDate(format!("{} does not exist in {}", date, tz)))?;

    let mut next = date.succ_opt();
    for _ in 0..2 {
        let Some(d) = next else { break };
        if let Some(end) = start_of_day(d, tz) {
            return Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)));
        }
        next = d.succ_opt();
    }
    Err(QiblaError::InvalidDate(format!("no following day after {} in {}", date, tz)))
}

/// Convert a UTC instant to local civil time.
pub fn to_local(instant: DateTime<Utc>, tz: &Tz) -> DateTime<Tz> {
    instant.with_timezone(tz)
}

// ===================== DATE PARSING =====================

/// Parse the query date in the observer's zone.
///
/// Accepts anything chrono-english understands ("2025-06-21", "today",
/// "tomorrow", "next friday"); `None` means today in `tz`.
///
/// # Errors
/// Returns `InvalidDate` if the text cannot be parsed
pub fn parse_date(input: Option<&str>, tz: &Tz) -> Result<NaiveDate> {
    let anchor = Utc::now().with_timezone(tz);
    match input {
        None => Ok(anchor.date_naive()),
        Some(s) => parse_date_string(s, anchor, Dialect::Us)
            .map(|dt| dt.with_timezone(tz).date_naive())
            .map_err(|e| QiblaError::InvalidDate(format!("'{}': {}", s, e))),
    }
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDateTime, Offset, Timelike};
    use chrono_tz::America::Sao_Paulo;
    use chrono_tz::Asia::Kuala_Lumpur;
    use chrono_tz::Europe::London;
    use chrono_tz::Pacific::Apia;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_zone_choice_parse() {
        assert_eq!(ZoneChoice::parse("location").unwrap(), ZoneChoice::Location);
        assert_eq!(ZoneChoice::parse("System").unwrap(), ZoneChoice::System);
        assert_eq!(ZoneChoice::parse("UTC").unwrap(), ZoneChoice::Utc);
        assert_eq!(
            ZoneChoice::parse("Asia/Kuala_Lumpur").unwrap(),
            ZoneChoice::Named(Kuala_Lumpur)
        );
        assert!(matches!(ZoneChoice::parse("Mars/Olympus_Mons"), Err(QiblaError::Config(_))));
    }

    #[test]
    fn test_resolve_timezone_kuala_lumpur() {
        let finder = TimezoneFinder::new();
        let kl = GeoPoint::new(3.139, 101.6869).unwrap();
        let zone = resolve_zone(ZoneChoice::Location, &kl, &finder);
        assert!(zone.resolved);
        // The dataset may canonicalise to the identical Singapore zone
        assert!(
            zone.tz == Kuala_Lumpur || zone.tz == chrono_tz::Asia::Singapore,
            "Expected a UTC+8 Malaysian zone, got {:?}",
            zone.tz
        );

        // Second lookup reuses the initialised finder
        assert_eq!(finder.resolve(&kl), Some(zone.tz));
    }

    #[test]
    fn test_resolve_named_zone_ignores_location() {
        let finder = TimezoneFinder::new();
        let kl = GeoPoint::new(3.139, 101.6869).unwrap();
        let zone = resolve_zone(ZoneChoice::Named(London), &kl, &finder);
        assert_eq!(zone, ResolvedZone { tz: London, resolved: true });
    }

    #[test]
    fn test_civil_day_bounds_plain_day() {
        let (start, end) = civil_day_bounds(ymd(2025, 6, 13), &Kuala_Lumpur).unwrap();
        assert_eq!(start.naive_utc(), ymd(2025, 6, 12).and_hms_opt(16, 0, 0).unwrap());
        assert_eq!((end - start).num_hours(), 24);
    }

    #[test]
    fn test_civil_day_bounds_dst_days() {
        // London spring forward: 23h day; autumn fall back: 25h day
        let (s, e) = civil_day_bounds(ymd(2025, 3, 30), &London).unwrap();
        assert_eq!((e - s).num_hours(), 23);
        let (s, e) = civil_day_bounds(ymd(2025, 10, 26), &London).unwrap();
        assert_eq!((e - s).num_hours(), 25);
    }

    #[test]
    fn test_civil_day_bounds_midnight_gap() {
        // Brazil used to spring forward at midnight: 2018-11-04 00:00 did not exist
        let (start, end) = civil_day_bounds(ymd(2018, 11, 4), &Sao_Paulo).unwrap();
        let local = start.with_timezone(&Sao_Paulo);
        assert_eq!(local.hour(), 1);
        assert_eq!((end - start).num_hours(), 23);
    }

    #[test]
    fn test_civil_day_bounds_samoa_skip() {
        assert!(matches!(
            civil_day_bounds(ymd(2011, 12, 30), &Apia),
            Err(QiblaError::InvalidDate(_))
        ));
        let (start, end) = civil_day_bounds(ymd(2011, 12, 29), &Apia).unwrap();
        assert_eq!(end.with_timezone(&Apia).date_naive(), ymd(2011, 12, 31));
        assert_eq!((end - start).num_hours(), 24);
    }

    #[test]
    fn test_local_round_trip_recovers_utc() {
        let instants = [
            Utc.with_ymd_and_hms(2025, 6, 13, 5, 42, 17).unwrap(),
            Utc.with_ymd_and_hms(2025, 10, 26, 1, 30, 0).unwrap(), // inside London's repeated hour
            Utc.with_ymd_and_hms(2025, 3, 30, 1, 0, 0).unwrap(),
        ];
        for tz in [Kuala_Lumpur, London, Sao_Paulo] {
            for &t in &instants {
                let local = to_local(t, &tz);
                assert_eq!(local.with_timezone(&Utc), t);
                // Via naive local time + offset, as a report consumer would
                let naive: NaiveDateTime = local.naive_local();
                let back = DateTime::<Utc>::from_naive_utc_and_offset(
                    naive - Duration::seconds(i64::from(local.offset().fix().local_minus_utc())),
                    Utc,
                );
                assert_eq!(back, t);
            }
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(Some("2025-06-13"), &Kuala_Lumpur).unwrap(), ymd(2025, 6, 13));
        assert!(parse_date(Some("not a date at all"), &Kuala_Lumpur).is_err());
        let today = Utc::now().with_timezone(&London).date_naive();
        assert_eq!(parse_date(None, &London).unwrap(), today);
    }
}
