// src/indicators/ema.rs
use crate::errors::IndicatorError;

/// EMA values aligned one-to-one with the closes they were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct EmaSeries {
    span: usize,
    values: Vec<f64>,
}

impl EmaSeries {
    pub fn span(&self) -> usize {
        self.span
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn latest(&self) -> f64 {
        // calculate_ema never builds an empty series
        self.values[self.values.len() - 1]
    }
}

pub fn smoothing_factor(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Recursive EMA without bias correction: seeded with the first close,
/// then `alpha * close + (1 - alpha) * previous`.
pub fn calculate_ema(closes: &[f64], span: usize) -> Result<EmaSeries, IndicatorError> {
    if span == 0 {
        return Err(IndicatorError::ZeroSpan);
    }
    let (first, rest) = closes.split_first().ok_or(IndicatorError::EmptyInput)?;

    let alpha = smoothing_factor(span);
    let mut values = Vec::with_capacity(closes.len());
    let mut prev = *first;
    values.push(prev);

    for &close in rest {
        prev = alpha * close + (1.0 - alpha) * prev;
        values.push(prev);
    }

    Ok(EmaSeries { span, values })
}
