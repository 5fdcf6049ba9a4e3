//! Outbound notification channels.

pub mod email;

pub use email::{EmailConfig, SmtpNotifier};

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::pipeline::types::NotificationPayload;

/// Delivers a formatted message to a destination address.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name, for logging.
    fn name(&self) -> &str;

    /// Deliver one payload, reporting transport errors.
    async fn deliver(&self, payload: &NotificationPayload) -> Result<(), ChannelError>;

    /// Deliver one payload; failures are logged and reported as `false`.
    async fn send(&self, payload: &NotificationPayload) -> bool {
        match self.deliver(payload).await {
            Ok(()) => {
                tracing::info!(
                    channel = self.name(),
                    to = %payload.to_address,
                    subject = %payload.subject,
                    "Notification sent"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    channel = self.name(),
                    to = %payload.to_address,
                    error = %e,
                    "Notification failed"
                );
                false
            }
        }
    }
}
