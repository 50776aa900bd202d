// =============================================================================
// src/data/price_feed.rs - Series provider boundary
// =============================================================================

use crate::errors::ProviderError;
use crate::types::{PriceSeries, SeriesRequest};
use async_trait::async_trait;

/// Anything that can hand back a normalized bar series for a symbol/timeframe.
///
/// Implementations own all upstream shape handling: callers only ever see a
/// non-empty `PriceSeries` or an error.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    async fn fetch_series(&self, request: &SeriesRequest) -> Result<PriceSeries, ProviderError>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}
