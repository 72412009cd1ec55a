//! Solar Position Sampler Module
//!
//! Turns ephemeris lookups into time-stamped samples, either one at a time
//! (root refinement) or as an evenly spaced series (bracketing, sun path).

use chrono::{DateTime, Duration, Utc};

use crate::ephemeris::Ephemeris;
use crate::error::Result;
use crate::geo::GeoPoint;

/// Sun direction at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarSample {
    pub instant: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub altitude_deg: f64,
}

impl SolarSample {
    pub fn is_sun_up(&self) -> bool {
        self.altitude_deg > 0.0
    }
}

/// Sampler bound to one observer and one ephemeris provider.
pub struct Sampler<'a, E: Ephemeris + ?Sized> {
    ephemeris: &'a E,
    location: GeoPoint,
}

impl<'a, E: Ephemeris + ?Sized> Sampler<'a, E> {
    pub fn new(ephemeris: &'a E, location: GeoPoint) -> Self {
        Self { ephemeris, location }
    }

    /// Sample the sun at an arbitrary instant.
    pub fn sample(&self, instant: DateTime<Utc>) -> Result<SolarSample> {
        let pos = self.ephemeris.position_at(&self.location, instant)?;
        Ok(SolarSample { instant, azimuth_deg: pos.azimuth, altitude_deg: pos.altitude })
    }

    /// Sample `[start, end]` every `step`, always including `end` itself.
    ///
    /// # Returns
    /// Samples ordered by instant; empty when `start >= end`
    pub fn sample_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: Duration,
    ) -> Result<Vec<SolarSample>> {
        if start >= end || step <= Duration::zero() {
            return Ok(Vec::new());
        }

        let capacity = ((end - start).num_seconds() / step.num_seconds().max(1)) as usize + 2;
        let mut samples = Vec::with_capacity(capacity);
        let mut t = start;

        // Loop until strictly before end, then add the exact end point
        while t < end {
            samples.push(self.sample(t)?);
            t += step;
        }
        samples.push(self.sample(end)?);

        Ok(samples)
    }
}

// ===================== TESTS =====================
