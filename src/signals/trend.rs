// src/signals/trend.rs
use crate::errors::IndicatorError;
use crate::indicators::calculate_ema;
use crate::types::PriceSeries;
use serde::Serialize;
use std::fmt;

pub const TREND_FAST_SPAN: usize = 21;
pub const TREND_MID_SPAN: usize = 34;
pub const TREND_SLOW_SPAN: usize = 90;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendSignal {
    Buy,
    Sell,
    /// No strict ordering of the three EMAs.
    #[serde(rename = "NONE")]
    Neutral,
}

impl TrendSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendSignal::Buy => "BUY",
            TrendSignal::Sell => "SELL",
            TrendSignal::Neutral => "NONE",
        }
    }

    pub fn is_directional(&self) -> bool {
        !matches!(self, TrendSignal::Neutral)
    }
}

impl fmt::Display for TrendSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict ordering only: any tie or mixed order is `Neutral`.
pub fn classify_trend(ema_fast: f64, ema_mid: f64, ema_slow: f64) -> TrendSignal {
    if ema_fast > ema_mid && ema_mid > ema_slow {
        TrendSignal::Buy
    } else if ema_fast < ema_mid && ema_mid < ema_slow {
        TrendSignal::Sell
    } else {
        TrendSignal::Neutral
    }
}

/// Latest EMA readings plus the classification they produced.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct TrendSnapshot {
    pub signal: TrendSignal,
    pub ema_fast: f64,
    pub ema_mid: f64,
    pub ema_slow: f64,
}

#[derive(Debug, Clone)]
pub struct TrendClassifier {
    fast_span: usize,
    mid_span: usize,
    slow_span: usize,
}

impl Default for TrendClassifier {
    fn default() -> Self {
        Self {
            fast_span: TREND_FAST_SPAN,
            mid_span: TREND_MID_SPAN,
            slow_span: TREND_SLOW_SPAN,
        }
    }
}

impl TrendClassifier {
    pub fn analyze(&self, series: &PriceSeries) -> Result<TrendSnapshot, IndicatorError> {
        let closes = series.closes();
        let ema_fast = calculate_ema(&closes, self.fast_span)?.latest();
        let ema_mid = calculate_ema(&closes, self.mid_span)?.latest();
        let ema_slow = calculate_ema(&closes, self.slow_span)?.latest();

        Ok(TrendSnapshot {
            signal: classify_trend(ema_fast, ema_mid, ema_slow),
            ema_fast,
            ema_mid,
            ema_slow,
        })
    }
}
