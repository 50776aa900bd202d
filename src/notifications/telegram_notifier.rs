// src/notifications/telegram_notifier.rs
use crate::config::TelegramConfig;
use crate::errors::NotifierError;
use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde_json::json;

/// Transport-level result of one delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReceipt {
    pub status: u16,
    pub body: String,
}

/// Destination for formatted alert text. One attempt per call, no retries.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<DeliveryReceipt, NotifierError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug)]
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        info!("📱 Telegram notifier initialized for chat {}", config.chat_id);

        Self {
            client: Client::builder()
                .timeout(config.timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_url, self.bot_token)
    }
}

#[async_trait]
impl AlertSink for TelegramNotifier {
    async fn deliver(&self, text: &str) -> Result<DeliveryReceipt, NotifierError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true
        });

        let response = self
            .client
            .post(self.send_message_url())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        if status.is_success() {
            info!("📱 [TELEGRAM] Response {}: {}", status.as_u16(), body);
            Ok(DeliveryReceipt {
                status: status.as_u16(),
                body,
            })
        } else {
            error!("📱 [TELEGRAM] Response {}: {}", status.as_u16(), body);
            Err(NotifierError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_send_message_url() {
        let notifier = TelegramNotifier::new(&TelegramConfig {
            bot_token: "123:abc".to_string(),
            chat_id: "-100".to_string(),
            api_url: "https://api.telegram.org/".to_string(),
            timeout: Duration::from_secs(15),
        });
        assert_eq!(notifier.send_message_url(), "https://api.telegram.org/bot123:abc/sendMessage");
    }
}
