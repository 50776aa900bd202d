// src/notifications/notification_manager.rs
use crate::notifications::telegram_notifier::{AlertSink, DeliveryReceipt};
use log::{debug, error, info, warn};
use std::sync::Arc;

pub const CONNECTION_TEST_MESSAGE: &str =
    "✅ Connection test OK! The retest alert bot can send messages to this chat.";

/// Wraps the sink so delivery failures are logged and never reach the caller.
#[derive(Clone)]
pub struct NotificationManager {
    sink: Arc<dyn AlertSink>,
}

impl NotificationManager {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self { sink }
    }

    /// Deliver an alert report. `None` means the sink did not accept it.
    pub async fn notify_alert(&self, text: &str) -> Option<DeliveryReceipt> {
        info!("📢 Sending retest alert via {}", self.sink.name());
        self.deliver(text).await
    }

    /// Send the startup connectivity message.
    pub async fn send_test_message(&self) -> Option<DeliveryReceipt> {
        info!("📢 Sending test message via {}", self.sink.name());
        let receipt = self.deliver(CONNECTION_TEST_MESSAGE).await;
        if receipt.is_none() {
            warn!("📢 Test message was not delivered; alerts may not arrive");
        }
        receipt
    }

    async fn deliver(&self, text: &str) -> Option<DeliveryReceipt> {
        match self.sink.deliver(text).await {
            Ok(receipt) => {
                info!("📢 {} accepted message ({})", self.sink.name(), receipt.status);
                if !receipt.body.is_empty() {
                    debug!("📢 {} response body: {}", self.sink.name(), receipt.body);
                }
                Some(receipt)
            }
            Err(e) => {
                // Log any errors but don't fail
                error!("📢 {} notification failed: {}", self.sink.name(), e);
                None
            }
        }
    }
}
