// src/realtime/retest_detector.rs
use crate::config::DEFAULT_ALMOST_RETEST_TOLERANCE;
use crate::indicators::calculate_ema;
use crate::types::{PriceSeries, Timeframe};
use log::{debug, warn};
use serde::Serialize;
use std::fmt;

pub const RETEST_FAST_SPAN: usize = 21;
pub const RETEST_SLOW_SPAN: usize = 34;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetestKind {
    /// Price is inside the EMA band, edges included.
    Retest,
    /// Price is outside the band but within the relative tolerance of its nearest edge.
    AlmostRetest,
}

impl fmt::Display for RetestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetestKind::Retest => f.write_str("RETEST"),
            RetestKind::AlmostRetest => f.write_str("ALMOST_RETEST"),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RetestFinding {
    pub timeframe: Timeframe,
    pub kind: RetestKind,
    pub price: f64,
    pub band_lower: f64,
    pub band_upper: f64,
}

/// Closed interval between two EMA readings, whichever is larger.
pub fn band(ema_a: f64, ema_b: f64) -> (f64, f64) {
    (ema_a.min(ema_b), ema_a.max(ema_b))
}

#[derive(Debug, Clone)]
pub struct RetestDetector {
    tolerance: f64,
    fast_span: usize,
    slow_span: usize,
}

impl Default for RetestDetector {
    fn default() -> Self {
        Self::new(DEFAULT_ALMOST_RETEST_TOLERANCE)
    }
}

impl RetestDetector {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            fast_span: RETEST_FAST_SPAN,
            slow_span: RETEST_SLOW_SPAN,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Classify `price` against the band formed by two EMA readings.
    /// An inside-band hit takes precedence; the tolerance is only consulted outside the band.
    pub fn evaluate(
        &self,
        timeframe: Timeframe,
        price: f64,
        ema_a: f64,
        ema_b: f64,
    ) -> Option<RetestFinding> {
        if price == 0.0 || !price.is_finite() || !ema_a.is_finite() || !ema_b.is_finite() {
            debug!("🔍 [RETEST] {} skipped: unusable price {} or EMAs", timeframe, price);
            return None;
        }

        let (band_lower, band_upper) = band(ema_a, ema_b);

        let kind = if band_lower <= price && price <= band_upper {
            RetestKind::Retest
        } else {
            let distance = (price - band_lower).abs().min((price - band_upper).abs());
            if distance / price.abs() <= self.tolerance {
                RetestKind::AlmostRetest
            } else {
                debug!(
                    "🔍 [RETEST] {} price {:.2} is {:.4}% from band {:.2}-{:.2}",
                    timeframe,
                    price,
                    distance / price.abs() * 100.0,
                    band_lower,
                    band_upper
                );
                return None;
            }
        };

        Some(RetestFinding {
            timeframe,
            kind,
            price,
            band_lower,
            band_upper,
        })
    }

    /// Run the band check on the latest bar of a fine-timeframe series.
    pub fn check_series(
        &self,
        timeframe: Timeframe,
        series: &PriceSeries,
    ) -> Option<RetestFinding> {
        let closes = series.closes();
        let emas = calculate_ema(&closes, self.fast_span)
            .and_then(|fast| calculate_ema(&closes, self.slow_span).map(|slow| (fast, slow)));

        match emas {
            Ok((fast, slow)) => {
                debug!(
                    "🔍 [RETEST] {} latest close {:.2}, EMA{} {:.2}, EMA{} {:.2}",
                    timeframe,
                    series.last_close(),
                    self.fast_span,
                    fast.latest(),
                    self.slow_span,
                    slow.latest()
                );
                self.evaluate(timeframe, series.last_close(), fast.latest(), slow.latest())
            }
            Err(e) => {
                warn!("🔍 [RETEST] {} EMA calculation failed: {}", timeframe, e);
                None
            }
        }
    }
}
