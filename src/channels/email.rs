//! Email notifier: SMTP via lettre.
//!
//! Every send builds its own STARTTLS transport and drops it before returning,
//! so the SMTP session is closed on success and on every error path.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use crate::channels::Notifier;
use crate::error::{ChannelError, ConfigError};
use crate::pipeline::types::NotificationPayload;

// ── Configuration ───────────────────────────────────────────────────

/// SMTP settings for outbound ticket notifications.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender_email: String,
    pub sender_password: SecretString,
    pub timeout: Duration,
}

impl EmailConfig {
    /// Build config from a key lookup (usually the environment).
    ///
    /// `SMTP_SERVER`, `SENDER_EMAIL` and `SENDER_PASSWORD` are required.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let smtp_host = required("SMTP_SERVER")?;
        let sender_email = required("SENDER_EMAIL")?;
        let sender_password = SecretString::from(required("SENDER_PASSWORD")?);

        let smtp_port = match lookup("SMTP_PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "SMTP_PORT".to_string(),
                message: format!("{raw}: {e}"),
            })?,
            None => 587,
        };

        let timeout_secs: u64 = match lookup("SMTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "SMTP_TIMEOUT_SECS".to_string(),
                message: format!("{raw}: {e}"),
            })?,
            None => 30,
        };

        Ok(Self {
            smtp_host,
            smtp_port,
            sender_email,
            sender_password,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// ── Notifier ────────────────────────────────────────────────────────

/// Sends ticket notifications over SMTP.
pub struct SmtpNotifier {
    config: EmailConfig,
}

impl SmtpNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn deliver(&self, payload: &NotificationPayload) -> Result<(), ChannelError> {
        let email = build_message(&self.config.sender_email, payload)?;
        let config = self.config.clone();

        tracing::info!(to = %payload.to_address, "Sending notification");

        // lettre's SmtpTransport is blocking.
        tokio::task::spawn_blocking(move || send_blocking(&config, &email))
            .await
            .map_err(|e| ChannelError::TaskFailed {
                name: "email".into(),
                reason: e.to_string(),
            })?
    }
}

/// Build the plain-text message for a payload.
pub fn build_message(from: &str, payload: &NotificationPayload) -> Result<Message, ChannelError> {
    let from: Mailbox = from.parse().map_err(|_| ChannelError::InvalidAddress {
        name: "email".into(),
        address: from.to_string(),
    })?;
    let to: Mailbox = payload
        .to_address
        .parse()
        .map_err(|_| ChannelError::InvalidAddress {
            name: "email".into(),
            address: payload.to_address.clone(),
        })?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(payload.subject.as_str())
        .body(payload.body.clone())
        .map_err(|e| ChannelError::SendFailed {
            name: "email".into(),
            reason: format!("Failed to build email: {e}"),
        })
}

/// Open a session, authenticate, send, and close.
fn send_blocking(config: &EmailConfig, email: &Message) -> Result<(), ChannelError> {
    let creds = Credentials::new(
        config.sender_email.clone(),
        config.sender_password.expose_secret().to_string(),
    );

    let transport = SmtpTransport::starttls_relay(&config.smtp_host)
        .map_err(|e| ChannelError::SendFailed {
            name: "email".into(),
            reason: format!("SMTP relay error: {e}"),
        })?
        .port(config.smtp_port)
        .credentials(creds)
        .timeout(Some(config.timeout))
        .build();

    transport.send(email).map_err(|e| ChannelError::SendFailed {
        name: "email".into(),
        reason: format!("SMTP send failed: {e}"),
    })?;

    Ok(())
}
