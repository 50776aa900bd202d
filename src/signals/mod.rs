// src/signals/mod.rs
pub mod trend;

pub use trend::{classify_trend, TrendClassifier, TrendSignal, TrendSnapshot};
