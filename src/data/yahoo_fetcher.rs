// src/data/yahoo_fetcher.rs
use crate::data::normalize::normalize_chart_result;
use crate::data::price_feed::SeriesProvider;
use crate::errors::ProviderError;
use crate::types::{PriceSeries, SeriesRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub struct YahooSeriesProvider {
    client: Client,
    base_url: String,
}

impl YahooSeriesProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn query_params(request: &SeriesRequest, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
        let start = now - request.lookback;
        vec![
            ("period1", start.timestamp().to_string()),
            ("period2", now.timestamp().to_string()),
            ("interval", request.timeframe.interval_code().to_string()),
            ("includePrePost", "false".to_string()),
        ]
    }
}

#[async_trait]
impl SeriesProvider for YahooSeriesProvider {
    async fn fetch_series(&self, request: &SeriesRequest) -> Result<PriceSeries, ProviderError> {
        let url = format!("{}/{}", self.base_url, request.symbol);
        let params = Self::query_params(request, Utc::now());

        debug!(
            "📡 [YAHOO] GET {} interval={} lookback={}d",
            url,
            request.timeframe.interval_code(),
            request.lookback.num_days()
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "Mozilla/5.0")
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let parsed: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(_) if !status.is_success() => {
                warn!("📡 [YAHOO] {} returned {}: {}", request.symbol, status, body);
                return Err(ProviderError::Upstream(format!("HTTP {}", status)));
            }
            Err(e) => return Err(e.into()),
        };

        parse_chart_response(&parsed, &request.symbol)
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}

/// Unwrap `chart.result[0]` (or surface `chart.error`) and normalize it.
pub fn parse_chart_response(body: &Value, symbol: &str) -> Result<PriceSeries, ProviderError> {
    if let Some(error) = body.pointer("/chart/error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(Value::as_str).unwrap_or("unknown");
        let description = error.get("description").and_then(Value::as_str).unwrap_or("");
        return Err(ProviderError::Upstream(format!("{} - {}", code, description)));
    }

    let result = body
        .pointer("/chart/result/0")
        .ok_or_else(|| ProviderError::Empty(format!("no chart result for {}", symbol)))?;

    normalize_chart_result(result, symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timeframe;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use serde_json::json;

    #[test]
    fn test_query_params_cover_lookback() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let request = SeriesRequest::new("GC=F", ChronoDuration::days(3), Timeframe::M15);
        let params = YahooSeriesProvider::query_params(&request, now);

        assert!(params.contains(&("period1", (1_700_000_000 - 3 * 86_400).to_string())));
        assert!(params.contains(&("period2", "1700000000".to_string())));
        assert!(params.contains(&("interval", "15m".to_string())));
    }

    #[test]
    fn test_chart_error_is_upstream() {
        let body = json!({
            "chart": {
                "result": null,
                "error": {
                    "code": "Not Found",
                    "description": "No data found, symbol may be delisted"
                }
            }
        });
        match parse_chart_response(&body, "XXX") {
            Err(ProviderError::Upstream(msg)) => assert!(msg.contains("Not Found")),
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_result_list() {
        let body = json!({ "chart": { "result": [], "error": null } });
        assert!(matches!(parse_chart_response(&body, "GC=F"), Err(ProviderError::Empty(_))));
    }

    #[test]
    fn test_full_chart_payload() {
        let body = json!({
            "chart": {
                "result": [{
                    "meta": { "symbol": "GC=F", "regularMarketPrice": 2650.1 },
                    "timestamp": [1700000000, 1700000300, 1700000600],
                    "indicators": {
                        "quote": [{
                            "open": [2648.0, 2649.0, 2650.0],
                            "high": [2649.5, 2650.5, 2651.0],
                            "low": [2647.5, 2648.5, 2649.5],
                            "close": [2649.0, 2650.0, 2650.5],
                            "volume": [120, 98, 143]
                        }]
                    }
                }],
                "error": null
            }
        });

        let series = parse_chart_response(&body, "GC=F").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last_close(), 2650.5);
    }
}
