// src/types.rs
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

// --- Bars ---
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
}

/// Time-ordered bars with strictly increasing timestamps. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Sorts by timestamp and keeps the last bar seen for a duplicated timestamp.
    /// Returns `None` when nothing is left.
    pub fn from_bars(mut bars: Vec<PriceBar>) -> Option<Self> {
        bars.retain(|b| b.close.is_finite());
        bars.sort_by_key(|b| b.timestamp);

        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => deduped.push(bar),
            }
        }

        if deduped.is_empty() {
            None
        } else {
            Some(Self { bars: deduped })
        }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last_close(&self) -> f64 {
        // from_bars guarantees at least one bar
        self.bars[self.bars.len() - 1].close
    }
}

// --- Timeframes ---
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    H1,
}

impl Timeframe {
    /// Label used in reports and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "H1",
        }
    }

    /// Interval token understood by the chart API.
    pub fn interval_code(&self) -> &'static str {
        match self {
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "5m" | "m5" => Ok(Timeframe::M5),
            "15m" | "m15" => Ok(Timeframe::M15),
            "1h" | "h1" | "60m" => Ok(Timeframe::H1),
            other => Err(format!("unsupported timeframe '{}'", other)),
        }
    }
}

// --- Provider request ---
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    pub symbol: String,
    pub lookback: Duration,
    pub timeframe: Timeframe,
}

impl SeriesRequest {
    pub fn new(symbol: &str, lookback: Duration, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.to_string(),
            lookback,
            timeframe,
        }
    }
}
