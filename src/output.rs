//! Output Formatting Module
//!
//! Provides formatting functions for terminal output of a day report.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::daylight::DaylightStatus;
use crate::report::{AlignmentReport, DayReport};
use crate::search::{ClosestApproach, TargetOutcome, TargetSearch};
use crate::time::to_local;

// ===================== TERMINAL OUTPUT =====================

/// Print the full day report: header, daylight and alignments.
pub fn print_day_report(report: &DayReport) {
    let tz = &report.zone.tz;

    println!("Location    : {}", report.location);
    if report.zone.resolved {
        println!("Date        : {} ({})", report.date, tz.name());
    } else {
        println!("Date        : {} (timezone unresolved, times in UTC)", report.date);
    }
    println!("Qibla       : {:8.3}°", report.qibla_bearing);
    println!("Opposite    : {:8.3}°", report.anti_bearing);
    println!();

    print_daylight(report);
    println!();

    println!("Shadow alignments:");
    for target in &report.outcomes {
        print_target(target, &report.alignments, tz);
    }
}

fn print_daylight(report: &DayReport) {
    let w = &report.window;
    let tz = &report.zone.tz;

    match w.status {
        DaylightStatus::Normal => {
            match w.sunrise {
                Some(t) => println!("Sunrise     : {}", format_local(t, tz)),
                None => println!("Sunrise     : before the start of the day"),
            }
            match w.sunset {
                Some(t) => println!("Sunset      : {}", format_local(t, tz)),
                None => println!("Sunset      : after the end of the day"),
            }
            if w.sunrise.is_some() && w.sunset.is_some() {
                println!("Daylight    : {}", format_day_length(w.duration()));
            }
        }
        DaylightStatus::PolarDay | DaylightStatus::PolarNight => println!("{}.", w.status),
    }
    println!("Solar noon  : {}", format_local(w.transit, tz));
}

fn print_target(target: &TargetSearch, alignments: &[AlignmentReport], tz: &Tz) {
    match &target.outcome {
        TargetOutcome::Found(_) => {
            for a in alignments.iter().filter(|a| a.kind == target.kind) {
                println!("{:<14}: {}", a.label, format_alignment_time(a));
                println!("  Bearing     : {:8.3}°", a.bearing_deg);
                println!("  Azimuth     : {:8.3}° (error {:.4}°)", a.azimuth_deg, a.azimuth_error_deg);
                println!("  Altitude    : {:8.3}°", a.altitude_deg);
            }
        }
        TargetOutcome::NoAlignmentToday { closest } => {
            println!("{:<14}: no alignment today", target.kind.label());
            if let Some(c) = closest {
                println!("  Closest     : {}", format_closest(c, tz));
            }
        }
        TargetOutcome::PolarNight => {
            println!("{:<14}: sun does not rise today", target.kind.label());
        }
    }
}

/// Print the above-horizon sun path, one row every `interval_minutes`.
pub fn print_sun_path(report: &DayReport, interval_minutes: u32) {
    println!();
    if report.path.is_empty() {
        println!("Sun path    : sun stays below the horizon");
        return;
    }

    let interval = Duration::minutes(i64::from(interval_minutes));
    println!("Sun path ({} min):", interval_minutes);
    println!("  {:<8}  {:>9}  {:>9}", "Time", "Azimuth", "Altitude");

    let mut next = report.path[0].instant;
    for s in &report.path {
        if s.instant < next {
            continue;
        }
        println!(
            "  {:<8}  {:8.2}°  {:8.2}°",
            to_local(s.instant, &report.zone.tz).format("%H:%M"),
            s.azimuth_deg,
            s.altitude_deg
        );
        next = s.instant + interval;
    }
}

// ===================== FORMATTING HELPERS =====================

/// "HH:MM:SS ZZZ" in `tz`.
pub fn format_local(t: DateTime<Utc>, tz: &Tz) -> String {
    to_local(t, tz).format("%H:%M:%S %Z").to_string()
}

/// Day length as "13h 05m 27s", rounded to the second.
fn format_day_length(d: Duration) -> String {
    let secs = (d.num_milliseconds().max(0) + 500) / 1000;
    format!("{}h {:02}m {:02}s", secs / 3600, secs % 3600 / 60, secs % 60)
}

fn format_alignment_time(a: &AlignmentReport) -> String {
    let local = a.instant_local.format("%H:%M:%S %:z");
    if a.timezone_resolved && a.instant_local.offset().local_minus_utc() != 0 {
        format!("{} ({} UTC)", local, a.instant_utc.format("%H:%M:%S"))
    } else {
        format!("{} UTC", a.instant_utc.format("%H:%M:%S"))
    }
}

fn format_closest(c: &ClosestApproach, tz: &Tz) -> String {
    format!(
        "{:.3}° off at {} (azimuth {:.3}°, altitude {:.1}°)",
        c.error_deg,
        format_local(c.instant, tz),
        c.azimuth_deg,
        c.altitude_deg
    )
}

// ===================== TESTS =====================
