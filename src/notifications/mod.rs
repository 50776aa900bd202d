// src/notifications/mod.rs
pub mod alert_formatter;
pub mod notification_manager;
pub mod telegram_notifier;

pub use alert_formatter::{format_alert_report, AlertReport};
pub use notification_manager::NotificationManager;
pub use telegram_notifier::{AlertSink, DeliveryReceipt, TelegramNotifier};
