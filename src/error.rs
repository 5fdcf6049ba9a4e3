//! Error types for the ticket intake service.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },
}

/// Outbound notification errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid address on channel {name}: {address}")]
    InvalidAddress { name: String, address: String },

    #[error("Channel {name} task failed: {reason}")]
    TaskFailed { name: String, reason: String },
}

/// Ticket pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Pipeline runner is shut down, rejected ticket {ticket_id}")]
    RunnerClosed { ticket_id: String },
}

/// Errors raised while handling an inbound message.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Scheduling failed: {0}")]
    Scheduling(#[from] PipelineError),
}
