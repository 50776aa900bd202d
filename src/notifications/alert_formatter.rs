// src/notifications/alert_formatter.rs
use crate::realtime::{RetestFinding, RetestKind};
use crate::signals::TrendSnapshot;
use crate::types::Timeframe;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const REPORT_TITLE: &str = "GOLD EMA Retest Alert";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Everything one alert message is built from.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AlertReport {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub trend: TrendSnapshot,
    /// In the order the timeframes were checked.
    pub findings: Vec<RetestFinding>,
}

/// Render the report with Telegram HTML emphasis.
pub fn format_alert_report(report: &AlertReport) -> String {
    let mut text = format!(
        "📊 <b>{}</b>\n\
        ⏰ {}\n\
        Symbol: {}\n\
        Timeframe: {}\n\
        Trend: <b>{}</b>\n\
        EMA21: {:.2} | EMA34: {:.2} | EMA90: {:.2}\n",
        REPORT_TITLE,
        report.generated_at.format(TIMESTAMP_FORMAT),
        escape_html(&report.symbol),
        Timeframe::H1.label(),
        report.trend.signal,
        report.trend.ema_fast,
        report.trend.ema_mid,
        report.trend.ema_slow,
    );

    let lines: Vec<String> = report
        .findings
        .iter()
        .map(|finding| format_finding(report, finding))
        .collect();
    text.push_str(&lines.join("\n"));
    text
}

fn format_finding(report: &AlertReport, finding: &RetestFinding) -> String {
    let direction = report.trend.signal;
    match finding.kind {
        RetestKind::Retest => format!(
            "⚠ <b>WARNING {}</b> - price retesting EMA21-34 area on TF {} (price: {:.2})",
            direction,
            finding.timeframe.label(),
            finding.price
        ),
        RetestKind::AlmostRetest => format!(
            "🔸 <b>ALMOST RETEST {}</b> - price approaching EMA21-34 area on TF {} (price: {:.2})",
            direction,
            finding.timeframe.label(),
            finding.price
        ),
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::TrendSignal;
    use chrono::TimeZone;

    fn report(findings: Vec<RetestFinding>) -> AlertReport {
        AlertReport {
            symbol: "GC=F".to_string(),
            generated_at: Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap(),
            trend: TrendSnapshot {
                signal: TrendSignal::Buy,
                ema_fast: 2650.104,
                ema_mid: 2648.0,
                ema_slow: 2640.496,
            },
            findings,
        }
    }

    fn finding(timeframe: Timeframe, kind: RetestKind, price: f64) -> RetestFinding {
        RetestFinding {
            timeframe,
            kind,
            price,
            band_lower: price - 1.0,
            band_upper: price + 1.0,
        }
    }

    #[test]
    fn test_header_layout() {
        let findings = vec![finding(Timeframe::M15, RetestKind::Retest, 2649.0)];
        let text = format_alert_report(&report(findings));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "📊 <b>GOLD EMA Retest Alert</b>");
        assert_eq!(lines[1], "⏰ 2026-10-19 08:30:00 UTC");
        assert_eq!(lines[2], "Symbol: GC=F");
        assert_eq!(lines[3], "Timeframe: H1");
        assert_eq!(lines[4], "Trend: <b>BUY</b>");
        assert_eq!(lines[5], "EMA21: 2650.10 | EMA34: 2648.00 | EMA90: 2640.50");
        assert_eq!(
            lines[6],
            "⚠ <b>WARNING BUY</b> - price retesting EMA21-34 area on TF 15m (price: 2649.00)"
        );
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_findings_keep_caller_order() {
        let text = format_alert_report(&report(vec![
            finding(Timeframe::M5, RetestKind::AlmostRetest, 2651.0),
            finding(Timeframe::M15, RetestKind::Retest, 2649.0),
        ]));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[6],
            "🔸 <b>ALMOST RETEST BUY</b> - price approaching EMA21-34 area on TF 5m (price: 2651.00)"
        );
        assert!(lines[7].contains("TF 15m"));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn test_symbol_is_escaped() {
        let mut r = report(vec![finding(Timeframe::M5, RetestKind::Retest, 1.0)]);
        r.symbol = "A&B<1>".to_string();
        assert!(format_alert_report(&r).contains("Symbol: A&amp;B&lt;1&gt;"));
    }
}
