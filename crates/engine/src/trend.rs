//! Soil-moisture history and drying-rate estimation.
//!
//! Samples land in a fixed-capacity ring (oldest overwritten when full) at
//! most once per sampling interval.  The trend is the ordinary least-squares
//! slope of moisture against elapsed hours since the oldest retained sample.
//!
//! Sign convention: negative = drying, positive = wetting.

use serde::Serialize;

use crate::sensors::Millis;
use crate::settings::TrendStrictness;

/// Ring capacity.  Ten samples at the default one-minute cadence cover the
/// nine-minute span the strict trend requires.
pub const SOIL_HISTORY_CAPACITY: usize = 10;

/// Default minimum spacing between recorded samples.
pub const SOIL_SAMPLE_INTERVAL_MS: Millis = 60 * 1000;

/// Fewer samples than this never produce a slope.
const MIN_SAMPLES: usize = 2;

/// Drying faster than this (%/h) is treated as a sensor glitch.
const MAX_PLAUSIBLE_DRYING_PER_HOUR: f64 = -20.0;

/// Regression denominators below this are numerically degenerate.
const DEGENERATE_DENOM: f64 = 1e-6;

/// History whose newest sample is older than this is not trusted.
const STALE_AFTER_MS: Millis = 15 * 60 * 1000;

const MS_PER_HOUR: f64 = 3_600_000.0;

impl TrendStrictness {
    /// Minimum time between oldest and newest sample before a slope is
    /// reported.
    pub fn min_span_ms(self) -> Millis {
        match self {
            Self::Relaxed => 10 * 1000,
            Self::Strict => 9 * 60 * 1000,
        }
    }
}

// ---------------------------------------------------------------------------
// Ring buffer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SoilSample {
    /// Soil moisture (%).
    pub moisture: f32,
    pub at: Millis,
}

/// Fixed-capacity ring of soil samples, oldest overwritten when full.
#[derive(Debug, Clone)]
pub struct SoilHistory {
    buf: [SoilSample; SOIL_HISTORY_CAPACITY],
    idx: usize,
    count: usize,
}

impl Default for SoilHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl SoilHistory {
    pub fn new() -> Self {
        Self {
            buf: [SoilSample::default(); SOIL_HISTORY_CAPACITY],
            idx: 0,
            count: 0,
        }
    }

    pub fn push(&mut self, sample: SoilSample) {
        self.buf[self.idx] = sample;
        self.idx = (self.idx + 1) % SOIL_HISTORY_CAPACITY;
        if self.count < SOIL_HISTORY_CAPACITY {
            self.count += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        SOIL_HISTORY_CAPACITY
    }

    /// Iterate samples oldest → newest.
    pub fn iter(&self) -> impl Iterator<Item = &SoilSample> {
        let start = if self.count < SOIL_HISTORY_CAPACITY { 0 } else { self.idx };
        (0..self.count).map(move |i| &self.buf[(start + i) % SOIL_HISTORY_CAPACITY])
    }

    pub fn oldest(&self) -> Option<&SoilSample> {
        self.iter().next()
    }

    pub fn newest(&self) -> Option<&SoilSample> {
        if self.count == 0 {
            return None;
        }
        let last = (self.idx + SOIL_HISTORY_CAPACITY - 1) % SOIL_HISTORY_CAPACITY;
        Some(&self.buf[last])
    }
}

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

/// A fitted moisture trend.  `span_hours == 0` means "not enough data".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Trend {
    /// Moisture change rate (%/h).
    pub rate_per_hour: f32,
    /// Time covered by the samples used for the fit (h).
    pub span_hours: f32,
}

impl Trend {
    pub const UNKNOWN: Self = Self {
        rate_per_hour: 0.0,
        span_hours: 0.0,
    };

    pub fn is_known(&self) -> bool {
        self.span_hours > 0.0
    }
}

/// Rate-limited sampler over a [`SoilHistory`].
#[derive(Debug, Clone)]
pub struct SoilTrendTracker {
    history: SoilHistory,
    sample_interval_ms: Millis,
}

impl Default for SoilTrendTracker {
    fn default() -> Self {
        Self::new(SOIL_SAMPLE_INTERVAL_MS)
    }
}

impl SoilTrendTracker {
    pub fn new(sample_interval_ms: Millis) -> Self {
        Self {
            history: SoilHistory::new(),
            sample_interval_ms,
        }
    }

    pub fn history(&self) -> &SoilHistory {
        &self.history
    }

    /// Append a sample unless the previous one is younger than the sampling
    /// interval.  Returns whether the sample was stored.
    pub fn record(&mut self, moisture: f32, now: Millis) -> bool {
        if !moisture.is_finite() {
            return false;
        }
        if let Some(last) = self.history.newest() {
            if now < last.at || now - last.at < self.sample_interval_ms {
                return false;
            }
        }
        self.history.push(SoilSample { moisture, at: now });
        true
    }

    /// Least-squares slope of moisture over elapsed hours.
    ///
    /// Returns [`Trend::UNKNOWN`] with fewer than two samples, a span shorter
    /// than `strictness` allows, stale history, or a degenerate fit.  Drying
    /// faster than 20 %/h is clamped to a zero rate.
    pub fn slope(&self, now: Millis, strictness: TrendStrictness) -> Trend {
        let (Some(oldest), Some(newest)) = (self.history.oldest(), self.history.newest()) else {
            return Trend::UNKNOWN;
        };
        if self.history.len() < MIN_SAMPLES {
            return Trend::UNKNOWN;
        }
        if now.saturating_sub(newest.at) > STALE_AFTER_MS {
            return Trend::UNKNOWN;
        }
        let span_ms = newest.at - oldest.at;
        if span_ms < strictness.min_span_ms() {
            return Trend::UNKNOWN;
        }

        let t0 = oldest.at;
        let n = self.history.len() as f64;
        let (mut sum_t, mut sum_m, mut sum_tt, mut sum_tm) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
        for s in self.history.iter() {
            let t = (s.at - t0) as f64 / MS_PER_HOUR;
            let m = f64::from(s.moisture);
            sum_t += t;
            sum_m += m;
            sum_tt += t * t;
            sum_tm += t * m;
        }

        let denom = n * sum_tt - sum_t * sum_t;
        if denom.abs() < DEGENERATE_DENOM {
            return Trend::UNKNOWN;
        }

        let mut rate = (n * sum_tm - sum_t * sum_m) / denom;
        if rate < MAX_PLAUSIBLE_DRYING_PER_HOUR {
            rate = 0.0;
        }

        Trend {
            rate_per_hour: rate as f32,
            span_hours: (span_ms as f64 / MS_PER_HOUR) as f32,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
