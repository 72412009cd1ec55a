//! Alignment Search Module
//!
//! Finds the instants when the sun's azimuth equals a target bearing, so a
//! vertical object's shadow lies along the qibla line.
//!
//! Algorithm: coarse scan + refinement on d(t) = normalize(azimuth(t) - target),
//! wrapped to (-180, 180].
//! 1. Scan consecutive samples inside the daylight window. A sign change of
//!    d with a small jump is a crossing; a jump near 360° is the wrap that
//!    happens when the sun passes the opposite bearing and is ignored.
//! 2. Each crossing bracket is refined by bisection on time.
//! 3. Runs of samples within tolerance that neither belong to nor border a
//!    bracket are tangential approaches (azimuth turning around); those are
//!    refined by golden-section minimisation of |d|.
//! 4. Candidates with residual above tolerance or the sun at/below the horizon
//!    are dropped, and candidates refined over overlapping sample spans are
//!    merged so one crossing gives one event at any sampling step.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace};

use crate::config::SearchConfig;
use crate::daylight::{DaylightStatus, DaylightWindow};
use crate::ephemeris::Ephemeris;
use crate::error::Result;
use crate::geo::{antipode, azimuth_difference};
use crate::sampler::{Sampler, SolarSample};

/// Bisection stops once the bracket is narrower than this.
const MIN_BRACKET_NS: i64 = 1_000_000;

/// Golden-section search stops once the interval is narrower than this (seconds).
const GOLDEN_TOL_SECONDS: f64 = 0.01;

// ===================== TYPES =====================

/// Which way the observer faces when the shadow is aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlignmentKind {
    /// Sun at the qibla bearing: the shadow points away from the Kaabah,
    /// so facing the sun means facing the qibla
    FacingQibla,
    /// Sun at the opposite bearing: the shadow points toward the Kaabah
    KaabahBehind,
}

impl AlignmentKind {
    pub const ALL: [AlignmentKind; 2] = [AlignmentKind::FacingQibla, AlignmentKind::KaabahBehind];

    /// Bearing the sun's azimuth has to match for this kind.
    pub fn target_bearing(&self, qibla_bearing: f64) -> f64 {
        match self {
            Self::FacingQibla => qibla_bearing,
            Self::KaabahBehind => antipode(qibla_bearing),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FacingQibla => "Facing Qibla",
            Self::KaabahBehind => "Kaabah Behind",
        }
    }
}

impl fmt::Display for AlignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A refined alignment instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentEvent {
    pub kind: AlignmentKind,
    pub target_bearing: f64,
    pub instant: DateTime<Utc>,
    pub azimuth_deg: f64,
    /// |azimuth - target| at `instant`
    pub azimuth_error_deg: f64,
    pub altitude_deg: f64,
}

/// The daylight sample where the sun came nearest to the target bearing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestApproach {
    pub instant: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub error_deg: f64,
    pub altitude_deg: f64,
}

/// Result of searching one target bearing over one day.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetOutcome {
    /// One or more alignments, ordered by instant
    Found(Vec<AlignmentEvent>),
    /// The sun was up but its azimuth never reached the bearing
    NoAlignmentToday { closest: Option<ClosestApproach> },
    /// The sun never rose
    PolarNight,
}

impl TargetOutcome {
    pub fn events(&self) -> &[AlignmentEvent] {
        match self {
            Self::Found(events) => events,
            _ => &[],
        }
    }
}

/// Outcome for one alignment kind.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSearch {
    pub kind: AlignmentKind,
    pub bearing: f64,
    pub outcome: TargetOutcome,
}

/// Both targets searched over one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySearch {
    pub qibla_bearing: f64,
    pub targets: Vec<TargetSearch>,
    /// Every event from every target, ordered by instant
    pub events: Vec<AlignmentEvent>,
}

// ===================== DAY SEARCH =====================

/// Sample the daylight window once and search both the qibla bearing and
/// its antipode.
pub fn search_day<E: Ephemeris + ?Sized>(
    sampler: &Sampler<'_, E>,
    window: &DaylightWindow,
    qibla_bearing: f64,
    config: &SearchConfig,
) -> Result<DaySearch> {
    let samples = if window.status == DaylightStatus::PolarNight {
        Vec::new()
    } else {
        sampler.sample_range(window.search_start, window.search_end, config.step())?
    };
    debug!(samples = samples.len(), qibla_bearing, "daylight window sampled");

    let mut targets = Vec::with_capacity(AlignmentKind::ALL.len());
    let mut events = Vec::new();
    for kind in AlignmentKind::ALL {
        let bearing = kind.target_bearing(qibla_bearing);
        let outcome = find_alignments(sampler, &samples, kind, bearing, window, config)?;
        events.extend_from_slice(outcome.events());
        targets.push(TargetSearch { kind, bearing, outcome });
    }
    events.sort_by_key(|e| e.instant);

    Ok(DaySearch { qibla_bearing, targets, events })
}

// ===================== TARGET SEARCH =====================

/// Find every alignment of the sun's azimuth with `target` inside `window`.
///
/// `samples` must be ordered by instant; samples outside the window are
/// ignored. The sampler is queried again at sub-step instants during
/// refinement.
///
/// # Errors
/// Only ephemeris failures; "no alignment" is an `Ok` outcome
pub fn find_alignments<E: Ephemeris + ?Sized>(
    sampler: &Sampler<'_, E>,
    samples: &[SolarSample],
    kind: AlignmentKind,
    target: f64,
    window: &DaylightWindow,
    config: &SearchConfig,
) -> Result<TargetOutcome> {
    if window.status == DaylightStatus::PolarNight {
        return Ok(TargetOutcome::PolarNight);
    }

    let tol = config.tolerance_deg;
    let daylight: Vec<SolarSample> =
        samples.iter().copied().filter(|s| window.contains(s.instant)).collect();
    let d: Vec<f64> = daylight.iter().map(|s| azimuth_difference(s.azimuth_deg, target)).collect();

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut bracketed = vec![false; daylight.len()];

    // Crossing brackets
    for i in 1..daylight.len() {
        if is_genuine_crossing(d[i - 1], d[i]) {
            bracketed[i - 1] = true;
            bracketed[i] = true;
            let sample = bisect_crossing(sampler, target, daylight[i - 1], daylight[i], config)?;
            candidates.push(Candidate { sample, span: (i - 1, i) });
        }
    }
    let crossings = candidates.len();

    // Tangential approaches: runs of in-tolerance samples with no bracket in
    // or next to them. A run touching a bracket is the flank of that crossing.
    let mut i = 0;
    while i < daylight.len() {
        if bracketed[i] || d[i].abs() > tol {
            i += 1;
            continue;
        }
        let first = i;
        while i + 1 < daylight.len() && !bracketed[i + 1] && d[i + 1].abs() <= tol {
            i += 1;
        }
        let last = i;
        i += 1;

        let lo = first.saturating_sub(1);
        let hi = (last + 1).min(daylight.len() - 1);
        if bracketed[lo] || bracketed[hi] {
            trace!(%kind, first, last, "in-tolerance run belongs to a crossing");
            continue;
        }
        let sample = minimize_offset(sampler, target, daylight[lo].instant, daylight[hi].instant, config)?;
        candidates.push(Candidate { sample, span: (lo, hi) });
    }
    debug!(%kind, target, crossings, touches = candidates.len() - crossings, "alignment brackets");

    let mut accepted: Vec<(AlignmentEvent, (usize, usize))> = Vec::new();
    for Candidate { sample: c, span } in candidates {
        let error = azimuth_difference(c.azimuth_deg, target).abs();
        if error > tol {
            debug!(%kind, instant = %c.instant, error, "candidate discarded: residual above tolerance");
            continue;
        }
        if !c.is_sun_up() {
            debug!(%kind, instant = %c.instant, altitude = c.altitude_deg, "candidate discarded: sun not above horizon");
            continue;
        }
        if !window.contains(c.instant) {
            debug!(%kind, instant = %c.instant, "candidate discarded: outside daylight window");
            continue;
        }
        let event = AlignmentEvent {
            kind,
            target_bearing: target,
            instant: c.instant,
            azimuth_deg: c.azimuth_deg,
            azimuth_error_deg: error,
            altitude_deg: c.altitude_deg,
        };
        accepted.push((event, span));
    }

    let events = merge_overlapping(accepted);

    if events.is_empty() {
        let closest = closest_approach(&daylight, target);
        debug!(%kind, target, ?closest, "no alignment today");
        return Ok(TargetOutcome::NoAlignmentToday { closest });
    }
    Ok(TargetOutcome::Found(events))
}

/// Check if a sign change is a genuine zero crossing vs a wrap-around discontinuity.
///
/// When the wrapped difference jumps from ~+180 to ~-180 the sun is passing
/// the opposite bearing, not the target.
fn is_genuine_crossing(d_a: f64, d_b: f64) -> bool {
    d_a * d_b < 0.0 && (d_a - d_b).abs() < 180.0
}

/// Bisect the bracket `[a, b]` down to `MIN_BRACKET_NS`.
///
/// Reaching tolerance does not stop the bisection: where the azimuth is
/// nearly flat many seconds are within tolerance and only the narrowed
/// bracket pins the actual crossing.
///
/// # Returns
/// The sample with the smallest |d| seen
fn bisect_crossing<E: Ephemeris + ?Sized>(
    sampler: &Sampler<'_, E>,
    target: f64,
    mut a: SolarSample,
    mut b: SolarSample,
    config: &SearchConfig,
) -> Result<SolarSample> {
    let mut fa = azimuth_difference(a.azimuth_deg, target);
    let fb = azimuth_difference(b.azimuth_deg, target);
    let mut best = if fa.abs() <= fb.abs() { a } else { b };
    let mut best_err = fa.abs().min(fb.abs());

    for iter in 0..config.max_iterations {
        let span = b.instant - a.instant;
        if span.num_nanoseconds().is_some_and(|ns| ns < MIN_BRACKET_NS) {
            trace!(iter, residual = best_err, "bisection converged");
            break;
        }

        let m = sampler.sample(a.instant + span / 2)?;
        let fm = azimuth_difference(m.azimuth_deg, target);
        if !fm.is_finite() {
            break;
        }
        if fm.abs() < best_err {
            best = m;
            best_err = fm.abs();
        }

        if fm.signum() == fa.signum() {
            a = m;
            fa = fm;
        } else {
            b = m;
        }
    }

    Ok(best)
}

/// Minimise |d| over `[lo, hi]` for a tangential approach.
fn minimize_offset<E: Ephemeris + ?Sized>(
    sampler: &Sampler<'_, E>,
    target: f64,
    lo: DateTime<Utc>,
    hi: DateTime<Utc>,
    config: &SearchConfig,
) -> Result<SolarSample> {
    let at = |secs: f64| lo + Duration::nanoseconds((secs * 1e9).round() as i64);
    let span = (hi - lo).num_milliseconds() as f64 / 1000.0;
    if span <= 0.0 {
        return sampler.sample(lo);
    }

    let (x, _) = golden_section_search(0.0, span, GOLDEN_TOL_SECONDS, config.max_iterations, |s| {
        let sample = sampler.sample(at(s))?;
        Ok(azimuth_difference(sample.azimuth_deg, target).abs())
    })?;

    sampler.sample(at(x))
}

/// Golden Section Search for the minimum of a unimodal function `f`
/// within `[min, max]`.
///
/// Returns (x_at_min, min_value)
fn golden_section_search<F>(
    min: f64,
    max: f64,
    tol: f64,
    max_iterations: u32,
    mut f: F,
) -> Result<(f64, f64)>
where
    F: FnMut(f64) -> Result<f64>,
{
    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let resphi = 2.0 - phi; // approx 0.382

    let mut a = min;
    let mut b = max;

    let mut c = a + resphi * (b - a);
    let mut d = b - resphi * (b - a);

    let mut fc = f(c)?;
    let mut fd = f(d)?;

    let mut iterations = 0;
    while (b - a).abs() > tol && iterations < max_iterations {
        if fc < fd {
            // Min is in [a, d]
            b = d;
            d = c;
            fd = fc;
            c = a + resphi * (b - a);
            fc = f(c)?;
        } else {
            // Min is in [c, b]
            a = c;
            c = d;
            fc = fd;
            d = b - resphi * (b - a);
            fd = f(d)?;
        }
        iterations += 1;
    }

    Ok(((a + b) / 2.0, fc.min(fd)))
}

/// A refined instant plus the sample indices `(lo, hi)` it was refined over.
struct Candidate {
    sample: SolarSample,
    span: (usize, usize),
}

/// Collapse candidates whose sample spans overlap or touch, keeping the one
/// with the smaller residual. Each crossing yields one event whatever the
/// sampling step.
///
/// # Returns
/// Events ordered by instant
fn merge_overlapping(mut accepted: Vec<(AlignmentEvent, (usize, usize))>) -> Vec<AlignmentEvent> {
    accepted.sort_by_key(|(_, span)| *span);

    let mut kept: Vec<(AlignmentEvent, (usize, usize))> = Vec::with_capacity(accepted.len());
    for (e, span) in accepted {
        match kept.last_mut() {
            Some((prev, prev_span)) if span.0 <= prev_span.1 => {
                trace!(first = %prev.instant, second = %e.instant, "merging candidates of one crossing");
                prev_span.1 = prev_span.1.max(span.1);
                if e.azimuth_error_deg < prev.azimuth_error_deg {
                    *prev = e;
                }
            }
            _ => kept.push((e, span)),
        }
    }

    let mut events: Vec<AlignmentEvent> = kept.into_iter().map(|(e, _)| e).collect();
    events.sort_by_key(|e| e.instant);
    events
}

fn closest_approach(daylight: &[SolarSample], target: f64) -> Option<ClosestApproach> {
    daylight
        .iter()
        .filter(|s| s.is_sun_up())
        .map(|s| ClosestApproach {
            instant: s.instant,
            azimuth_deg: s.azimuth_deg,
            error_deg: azimuth_difference(s.azimuth_deg, target).abs(),
            altitude_deg: s.altitude_deg,
        })
        .min_by(|a, b| a.error_deg.total_cmp(&b.error_deg))
}

// ===================== TESTS =====================
