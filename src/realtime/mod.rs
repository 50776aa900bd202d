// src/realtime/mod.rs
pub mod retest_detector;

pub use retest_detector::{RetestDetector, RetestFinding, RetestKind};
