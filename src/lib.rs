//! Support ticket intake: webhook chat messages to department notifications.

pub mod channels;
pub mod config;
pub mod error;
pub mod intake;
pub mod llm;
pub mod pipeline;
