// src/data/normalize.rs
// Column-shape normalization for chart responses.

use crate::errors::ProviderError;
use crate::types::{PriceBar, PriceSeries};
use chrono::{TimeZone, Utc};
use log::{debug, warn};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalColumn {
    Open,
    High,
    Low,
    Close,
    AdjClose,
}

/// Case-insensitive mapping of upstream column names. Anything else is ignored.
pub fn canonical_column(name: &str) -> Option<CanonicalColumn> {
    match name.trim().to_lowercase().as_str() {
        "open" => Some(CanonicalColumn::Open),
        "high" => Some(CanonicalColumn::High),
        "low" => Some(CanonicalColumn::Low),
        "close" => Some(CanonicalColumn::Close),
        "adjclose" | "adj close" | "adj_close" => Some(CanonicalColumn::AdjClose),
        _ => None,
    }
}

/// Timestamps plus named numeric columns, exactly as upstream laid them out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame {
    pub timestamps: Vec<i64>,
    pub columns: Vec<(String, Vec<Option<f64>>)>,
}

impl RawFrame {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    fn first_column(&self, wanted: CanonicalColumn) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(name, _)| canonical_column(name) == Some(wanted))
            .map(|(_, values)| values.as_slice())
    }
}

/// Map a raw frame onto canonical bars. A real Close column wins over an
/// adjusted one; rows without a numeric close are dropped.
pub fn normalize_frame(frame: &RawFrame) -> Result<PriceSeries, ProviderError> {
    let close = frame
        .first_column(CanonicalColumn::Close)
        .or_else(|| frame.first_column(CanonicalColumn::AdjClose))
        .ok_or_else(|| ProviderError::MissingClose(frame.column_names()))?;
    let open = frame.first_column(CanonicalColumn::Open);
    let high = frame.first_column(CanonicalColumn::High);
    let low = frame.first_column(CanonicalColumn::Low);

    let value_at =
        |col: Option<&[Option<f64>]>, i: usize| col.and_then(|c| c.get(i).copied().flatten());

    let mut dropped = 0usize;
    let mut bars = Vec::with_capacity(frame.timestamps.len());
    for (i, &ts) in frame.timestamps.iter().enumerate() {
        let timestamp = Utc.timestamp_opt(ts, 0).single();
        let (Some(timestamp), Some(close)) = (timestamp, value_at(Some(close), i)) else {
            dropped += 1;
            continue;
        };
        bars.push(PriceBar {
            timestamp,
            open: value_at(open, i),
            high: value_at(high, i),
            low: value_at(low, i),
            close,
        });
    }

    if dropped > 0 {
        debug!("🧹 [NORMALIZE] Dropped {} rows without a usable close", dropped);
    }

    PriceSeries::from_bars(bars).ok_or_else(|| {
        ProviderError::Empty(format!("{} rows, none with a close", frame.timestamps.len()))
    })
}

/// Ways a chart result may lay out its columns. Tried in order, first success wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLayout {
    /// `indicators.quote[0].close`, `indicators.adjclose[0].adjclose`
    Flat,
    /// `indicators.<TICKER>.close` or `indicators.quote[0].<TICKER>.close`
    TickerKeyed,
    /// Column names carrying the ticker too, e.g. `Close|GC=F` or `('Close', 'GC=F')`
    Tupled,
}

pub const LAYOUT_FALLBACKS: [ColumnLayout; 3] =
    [ColumnLayout::Flat, ColumnLayout::TickerKeyed, ColumnLayout::Tupled];

impl ColumnLayout {
    pub fn extract(&self, result: &Value, symbol: &str) -> Result<RawFrame, ProviderError> {
        let timestamps = timestamps(result)?;
        let indicators = result
            .get("indicators")
            .and_then(Value::as_object)
            .ok_or_else(|| ProviderError::Shape("missing indicators".to_string()))?;

        let columns = match self {
            ColumnLayout::Flat => {
                let mut columns = Vec::new();
                for key in ["quote", "adjclose"] {
                    if let Some(block) = first_block(indicators, key) {
                        columns.extend(numeric_columns(block));
                    }
                }
                columns
            }
            ColumnLayout::TickerKeyed => {
                let block = ticker_block(indicators, symbol)
                    .or_else(|| {
                        first_block(indicators, "quote").and_then(|q| ticker_block(q, symbol))
                    })
                    .ok_or_else(|| ProviderError::Shape(format!("no block keyed by {}", symbol)))?;
                numeric_columns(block)
            }
            ColumnLayout::Tupled => {
                let block = first_block(indicators, "quote")
                    .ok_or_else(|| ProviderError::Shape("missing quote block".to_string()))?;
                numeric_columns(block)
                    .into_iter()
                    .map(|(name, values)| (strip_ticker(&name, symbol), values))
                    .collect()
            }
        };

        Ok(RawFrame { timestamps, columns })
    }
}

/// Try every layout in turn against one chart result.
pub fn normalize_chart_result(result: &Value, symbol: &str) -> Result<PriceSeries, ProviderError> {
    let mut last_error = ProviderError::Shape("no layouts attempted".to_string());

    for layout in LAYOUT_FALLBACKS {
        match layout.extract(result, symbol).and_then(|frame| normalize_frame(&frame)) {
            Ok(series) => {
                debug!(
                    "🧩 [NORMALIZE] {} parsed with {:?} layout ({} bars)",
                    symbol,
                    layout,
                    series.len()
                );
                return Ok(series);
            }
            Err(e) => {
                debug!("🧩 [NORMALIZE] {:?} layout failed for {}: {}", layout, symbol, e);
                last_error = e;
            }
        }
    }

    warn!("❌ [NORMALIZE] No layout produced a Close column for {}: {}", symbol, last_error);
    Err(last_error)
}

fn timestamps(result: &Value) -> Result<Vec<i64>, ProviderError> {
    let raw = result
        .get("timestamp")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Empty("no timestamps".to_string()))?;

    raw.iter()
        .map(|v| v.as_i64().ok_or_else(|| ProviderError::Shape(format!("bad timestamp {}", v))))
        .collect()
}

/// `indicators.quote` is normally a one-element array; a bare object is accepted too.
fn first_block<'a>(parent: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    match parent.get(key)? {
        Value::Array(items) => items.first().and_then(Value::as_object),
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn ticker_block<'a>(
    parent: &'a Map<String, Value>,
    symbol: &str,
) -> Option<&'a Map<String, Value>> {
    parent
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(symbol))
        .and_then(|(_, value)| match value {
            Value::Array(items) => items.first().and_then(Value::as_object),
            Value::Object(map) => Some(map),
            _ => None,
        })
}

fn numeric_columns(block: &Map<String, Value>) -> Vec<(String, Vec<Option<f64>>)> {
    block
        .iter()
        .filter_map(|(name, value)| {
            let values = value.as_array()?;
            Some((name.clone(), values.iter().map(Value::as_f64).collect()))
        })
        .collect()
}

fn strip_ticker(name: &str, symbol: &str) -> String {
    let lower_name = name.to_lowercase();
    let lower_symbol = symbol.to_lowercase();
    let without = match lower_name.find(&lower_symbol) {
        Some(pos) if !lower_symbol.is_empty() && name.is_ascii() => {
            format!("{}{}", &name[..pos], &name[pos + lower_symbol.len()..])
        }
        _ => name.to_string(),
    };
    without
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '[' | ']' | '\'' | '"' | '|' | ',' | ':'))
        .collect::<String>()
        .trim()
        .to_string()
}
