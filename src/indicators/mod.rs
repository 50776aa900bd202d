// src/indicators/mod.rs
pub mod ema;

pub use ema::{calculate_ema, EmaSeries};
