// src/monitor.rs
// Analysis cycle: H1 trend gate, then per-timeframe retest checks, then one alert.

use crate::config::MonitorConfig;
use crate::data::SeriesProvider;
use crate::errors::ProviderError;
use crate::notifications::{format_alert_report, AlertReport, AlertSink, NotificationManager};
use crate::realtime::{RetestDetector, RetestFinding};
use crate::signals::{TrendClassifier, TrendSnapshot};
use crate::types::{PriceSeries, SeriesRequest, Timeframe};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::FutureExt;
use log::{error, info, warn};
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// H1 data could not be fetched or normalized.
    DataUnavailable,
    NoTrend { trend: TrendSnapshot },
    NoRetest { trend: TrendSnapshot },
    Alerted {
        report: AlertReport,
        text: String,
        delivered: bool,
    },
}

pub struct RetestMonitor {
    config: MonitorConfig,
    provider: Arc<dyn SeriesProvider>,
    notifications: NotificationManager,
    trend_classifier: TrendClassifier,
    retest_detector: RetestDetector,
}

impl RetestMonitor {
    pub fn new(
        config: MonitorConfig,
        provider: Arc<dyn SeriesProvider>,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        let retest_detector = RetestDetector::new(config.almost_retest_tolerance);
        Self {
            config,
            provider,
            notifications: NotificationManager::new(sink),
            trend_classifier: TrendClassifier::default(),
            retest_detector,
        }
    }

    pub fn notifications(&self) -> &NotificationManager {
        &self.notifications
    }

    /// One full analysis pass. Never fails: every anticipated problem maps to an outcome.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleOutcome {
        let symbol = &self.config.symbol;
        let h1_request = SeriesRequest::new(
            symbol,
            ChronoDuration::days(self.config.trend_lookback_days),
            Timeframe::H1,
        );

        let h1_series = match self.fetch(&h1_request).await {
            Ok(series) => series,
            Err(e) => {
                warn!(
                    "❌ [H1_TREND] Failed to fetch H1 data for {} from {}: {}",
                    symbol,
                    self.provider.name(),
                    e
                );
                return CycleOutcome::DataUnavailable;
            }
        };

        let trend = match self.trend_classifier.analyze(&h1_series) {
            Ok(trend) => trend,
            Err(e) => {
                warn!("❌ [H1_TREND] EMA calculation failed for {}: {}", symbol, e);
                return CycleOutcome::DataUnavailable;
            }
        };

        info!(
            "📈 [H1_TREND] {} EMA21 {:.2} | EMA34 {:.2} | EMA90 {:.2} -> {}",
            symbol, trend.ema_fast, trend.ema_mid, trend.ema_slow, trend.signal
        );

        if !trend.signal.is_directional() {
            info!("❎ [H1_TREND] No clear H1 trend for {}, skipping retest check", symbol);
            return CycleOutcome::NoTrend { trend };
        }

        let findings = self.collect_findings().await;
        if findings.is_empty() {
            info!("✅ [RETEST] No retest on any timeframe for {}, no alert sent", symbol);
            return CycleOutcome::NoRetest { trend };
        }

        let report = AlertReport {
            symbol: symbol.clone(),
            generated_at: now,
            trend,
            findings,
        };
        let text = format_alert_report(&report);
        info!("🚨 [ALERT]\n{}", text);
        let delivered = self.notifications.notify_alert(&text).await.is_some();

        CycleOutcome::Alerted {
            report,
            text,
            delivered,
        }
    }

    /// Check each configured timeframe in order. Fetch failures only skip that timeframe.
    pub async fn collect_findings(&self) -> Vec<RetestFinding> {
        let lookback = ChronoDuration::days(self.config.retest_lookback_days);
        let mut findings = Vec::new();

        for &timeframe in &self.config.retest_timeframes {
            let request = SeriesRequest::new(&self.config.symbol, lookback, timeframe);
            let series = match self.fetch(&request).await {
                Ok(series) => series,
                Err(e) => {
                    warn!(
                        "⚠️  [RETEST] Skipping {} for {} ({}): {}",
                        timeframe,
                        self.config.symbol,
                        self.provider.name(),
                        e
                    );
                    continue;
                }
            };

            if let Some(finding) = self.retest_detector.check_series(timeframe, &series) {
                info!(
                    "🎯 [RETEST] {} {} on {} @ {:.2} (band {:.2}-{:.2})",
                    self.config.symbol,
                    finding.kind,
                    timeframe,
                    finding.price,
                    finding.band_lower,
                    finding.band_upper
                );
                findings.push(finding);
            }
        }

        findings
    }

    /// `run_cycle` with a panic caught at the cycle boundary. `None` means the cycle blew up.
    pub async fn guarded_cycle(&self, now: DateTime<Utc>) -> Option<CycleOutcome> {
        match AssertUnwindSafe(self.run_cycle(now)).catch_unwind().await {
            Ok(outcome) => Some(outcome),
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("💥 Analysis cycle aborted: {}", reason);
                None
            }
        }
    }

    /// Poll until `shutdown` flips to true (or its sender is dropped).
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "🚀 Retest monitor started for {} (every {}s)",
            self.config.symbol,
            self.config.poll_interval.as_secs()
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = self.guarded_cycle(Utc::now()) => {}
                _ = shutdown.changed() => {
                    info!("🛑 Shutdown requested during analysis cycle");
                    break;
                }
            }

            info!("⏳ Waiting {}s before next check...", self.config.poll_interval.as_secs());
            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("🛑 Retest monitor stopped");
    }

    async fn fetch(&self, request: &SeriesRequest) -> Result<PriceSeries, ProviderError> {
        let limit = self.config.provider_timeout;
        match tokio::time::timeout(limit, self.provider.fetch_series(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                provider: self.provider.name(),
                limit,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NotifierError;
    use crate::notifications::DeliveryReceipt;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    struct StalledProvider;

    #[async_trait]
    impl SeriesProvider for StalledProvider {
        async fn fetch_series(&self, _: &SeriesRequest) -> Result<PriceSeries, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ProviderError::Empty("unreachable".to_string()))
        }

        fn name(&self) -> &'static str {
            "stalled-feed"
        }
    }

    struct NullSink;

    #[async_trait]
    impl AlertSink for NullSink {
        async fn deliver(&self, _: &str) -> Result<DeliveryReceipt, NotifierError> {
            Ok(DeliveryReceipt {
                status: 200,
                body: String::new(),
            })
        }

        fn name(&self) -> &'static str {
            "null"
        }
    }

    #[tokio::test]
    async fn test_timeout_names_the_provider() {
        let vars: HashMap<&str, &str> =
            [("TELEGRAM_BOT_TOKEN", "t"), ("TELEGRAM_CHAT_ID", "1")].into_iter().collect();
        let mut config =
            MonitorConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        config.provider_timeout = Duration::from_millis(20);
        let monitor = RetestMonitor::new(config, Arc::new(StalledProvider), Arc::new(NullSink));
        let request = SeriesRequest::new("GC=F", ChronoDuration::days(3), Timeframe::M5);

        let err = monitor.fetch(&request).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Timeout {
                provider: "stalled-feed",
                ..
            }
        ));
        assert_eq!(err.to_string(), "stalled-feed request timed out after 20ms");
    }
}
