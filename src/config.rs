// src/config.rs
use crate::errors::ConfigError;
use crate::types::Timeframe;
use log::info;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SYMBOL: &str = "GC=F";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 120;
pub const DEFAULT_ALMOST_RETEST_TOLERANCE: f64 = 0.001;
pub const DEFAULT_TREND_LOOKBACK_DAYS: i64 = 30;
pub const DEFAULT_RETEST_LOOKBACK_DAYS: i64 = 3;
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_NOTIFIER_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub symbol: String,
    pub poll_interval: Duration,
    pub almost_retest_tolerance: f64,
    /// Checked in this order; findings are reported in the same order.
    pub retest_timeframes: Vec<Timeframe>,
    pub trend_lookback_days: i64,
    pub retest_lookback_days: i64,
    pub provider_timeout: Duration,
    pub yahoo_base_url: String,
    pub telegram: TelegramConfig,
}

impl MonitorConfig {
    /// Read everything from the process environment. Call after the env file is loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but with an injectable lookup, so tests never touch the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = required(&lookup, "TELEGRAM_BOT_TOKEN")?;
        let chat_id = required(&lookup, "TELEGRAM_CHAT_ID")?;

        let symbol = lookup("GOLD_TICKER")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());

        let poll_interval_secs: u64 =
            parsed(&lookup, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let almost_retest_tolerance: f64 =
            parsed(&lookup, "ALMOST_RETEST_TOLERANCE", DEFAULT_ALMOST_RETEST_TOLERANCE)?;
        if !almost_retest_tolerance.is_finite() || almost_retest_tolerance < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "ALMOST_RETEST_TOLERANCE",
                value: almost_retest_tolerance.to_string(),
            });
        }

        let retest_timeframes = match lookup("RETEST_TIMEFRAMES") {
            Some(raw) => parse_timeframes(&raw)?,
            None => vec![Timeframe::M5, Timeframe::M15],
        };

        let trend_lookback_days: i64 =
            parsed(&lookup, "TREND_LOOKBACK_DAYS", DEFAULT_TREND_LOOKBACK_DAYS)?;
        let retest_lookback_days: i64 =
            parsed(&lookup, "RETEST_LOOKBACK_DAYS", DEFAULT_RETEST_LOOKBACK_DAYS)?;
        for (name, days) in [
            ("TREND_LOOKBACK_DAYS", trend_lookback_days),
            ("RETEST_LOOKBACK_DAYS", retest_lookback_days),
        ] {
            if days <= 0 {
                return Err(ConfigError::InvalidValue { name, value: days.to_string() });
            }
        }

        let provider_timeout_secs: u64 =
            parsed(&lookup, "PROVIDER_TIMEOUT_SECS", DEFAULT_PROVIDER_TIMEOUT_SECS)?;
        let notifier_timeout_secs: u64 =
            parsed(&lookup, "NOTIFIER_TIMEOUT_SECS", DEFAULT_NOTIFIER_TIMEOUT_SECS)?;
        // intervals and timeouts must be at least one second
        for (name, secs) in [
            ("POLL_INTERVAL_SECS", poll_interval_secs),
            ("PROVIDER_TIMEOUT_SECS", provider_timeout_secs),
            ("NOTIFIER_TIMEOUT_SECS", notifier_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::InvalidValue { name, value: secs.to_string() });
            }
        }

        let yahoo_base_url =
            lookup("YAHOO_BASE_URL").unwrap_or_else(|| DEFAULT_YAHOO_BASE_URL.to_string());
        let telegram_api_url =
            lookup("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string());

        Ok(Self {
            symbol,
            poll_interval: Duration::from_secs(poll_interval_secs),
            almost_retest_tolerance,
            retest_timeframes,
            trend_lookback_days,
            retest_lookback_days,
            provider_timeout: Duration::from_secs(provider_timeout_secs),
            yahoo_base_url,
            telegram: TelegramConfig {
                bot_token,
                chat_id,
                api_url: telegram_api_url,
                timeout: Duration::from_secs(notifier_timeout_secs),
            },
        })
    }

    /// Replace the tracked symbol, e.g. from a command-line flag.
    pub fn override_symbol(&mut self, raw: &str) -> Result<(), ConfigError> {
        let symbol = raw.trim();
        if symbol.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "--symbol",
                value: raw.to_string(),
            });
        }
        self.symbol = symbol.to_string();
        Ok(())
    }

    pub fn log_summary(&self) {
        info!("⚙️  Configuration:");
        info!("   📊 Symbol: {}", self.symbol);
        info!("   ⏱️  Poll interval: {}s", self.poll_interval.as_secs());
        info!("   🎯 Almost-retest tolerance: {}", self.almost_retest_tolerance);
        info!(
            "   🔍 Retest timeframes: {}",
            self.retest_timeframes.iter().map(|t| t.label()).collect::<Vec<_>>().join(", ")
        );
        info!(
            "   📅 Lookback: H1 {}d, retest {}d",
            self.trend_lookback_days, self.retest_lookback_days
        );
        info!("   📱 Telegram chat: {}", self.telegram.chat_id);
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

fn parsed<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        None => Ok(default),
    }
}

fn parse_timeframes(raw: &str) -> Result<Vec<Timeframe>, ConfigError> {
    let timeframes = raw
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<Timeframe>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ConfigError::InvalidValue {
            name: "RETEST_TIMEFRAMES",
            value: raw.to_string(),
        })?;

    if timeframes.is_empty() {
        return Err(ConfigError::InvalidValue {
            name: "RETEST_TIMEFRAMES",
            value: raw.to_string(),
        });
    }
    Ok(timeframes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults_with_credentials_only() {
        let vars = env(&[("TELEGRAM_BOT_TOKEN", "abc"), ("TELEGRAM_CHAT_ID", "42")]);
        let config = MonitorConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.symbol, "GC=F");
        assert_eq!(config.poll_interval, Duration::from_secs(120));
        assert_eq!(config.almost_retest_tolerance, 0.001);
        assert_eq!(config.retest_timeframes, vec![Timeframe::M5, Timeframe::M15]);
        assert_eq!(config.trend_lookback_days, 30);
        assert_eq!(config.retest_lookback_days, 3);
        assert_eq!(config.telegram.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_missing_credentials_is_an_error() {
        let vars = env(&[("TELEGRAM_BOT_TOKEN", "abc")]);
        let err = MonitorConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("TELEGRAM_CHAT_ID")));

        let vars = env(&[("TELEGRAM_BOT_TOKEN", "  "), ("TELEGRAM_CHAT_ID", "42")]);
        let err = MonitorConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("TELEGRAM_BOT_TOKEN")));
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let vars = env(&[
            ("TELEGRAM_BOT_TOKEN", "abc"),
            ("TELEGRAM_CHAT_ID", "42"),
            ("GOLD_TICKER", "XAUUSD=X"),
            ("RETEST_TIMEFRAMES", "15m, 5m"),
            ("ALMOST_RETEST_TOLERANCE", "0.002"),
        ]);
        let config = MonitorConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.symbol, "XAUUSD=X");
        assert_eq!(config.retest_timeframes, vec![Timeframe::M15, Timeframe::M5]);
        assert_eq!(config.almost_retest_tolerance, 0.002);

        let vars = env(&[
            ("TELEGRAM_BOT_TOKEN", "abc"),
            ("TELEGRAM_CHAT_ID", "42"),
            ("POLL_INTERVAL_SECS", "soon"),
        ]);
        let err = MonitorConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "POLL_INTERVAL_SECS", .. }));

        let vars = env(&[
            ("TELEGRAM_BOT_TOKEN", "abc"),
            ("TELEGRAM_CHAT_ID", "42"),
            ("RETEST_TIMEFRAMES", "4h"),
        ]);
        assert!(MonitorConfig::from_lookup(|k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn test_zero_intervals_are_rejected() {
        for name in ["POLL_INTERVAL_SECS", "PROVIDER_TIMEOUT_SECS", "NOTIFIER_TIMEOUT_SECS"] {
            let vars =
                env(&[("TELEGRAM_BOT_TOKEN", "abc"), ("TELEGRAM_CHAT_ID", "42"), (name, "0")]);
            let err = MonitorConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
            match err {
                ConfigError::InvalidValue { name: rejected, value } => {
                    assert_eq!(rejected, name);
                    assert_eq!(value, "0");
                }
                other => panic!("expected InvalidValue for {}, got {:?}", name, other),
            }
        }

        let vars = env(&[
            ("TELEGRAM_BOT_TOKEN", "abc"),
            ("TELEGRAM_CHAT_ID", "42"),
            ("POLL_INTERVAL_SECS", "1"),
            ("PROVIDER_TIMEOUT_SECS", "1"),
        ]);
        let config = MonitorConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.provider_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_symbol_override_is_trimmed_and_non_empty() {
        let vars = env(&[("TELEGRAM_BOT_TOKEN", "abc"), ("TELEGRAM_CHAT_ID", "42")]);
        let mut config = MonitorConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();

        config.override_symbol("  SI=F \n").unwrap();
        assert_eq!(config.symbol, "SI=F");

        for blank in ["", "   ", "\t"] {
            let err = config.override_symbol(blank).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { name: "--symbol", .. }));
        }
        assert_eq!(config.symbol, "SI=F");
    }
}
