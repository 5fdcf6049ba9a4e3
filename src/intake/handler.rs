//! Intake handler: the synchronous entry point for inbound chat messages.
//!
//! Canned commands are answered directly. Ticket-worthy text gets a ticket ID
//! on the request path, its pipeline run is handed to the `PipelineRunner`,
//! and the acknowledgment is returned without waiting for the run.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::IntakeError;
use crate::intake::commands::{APOLOGY_TEXT, Command, dispatch};
use crate::pipeline::processor::TicketPipeline;
use crate::pipeline::runner::PipelineRunner;
use crate::pipeline::types::{IntakeMessage, TicketId, UNKNOWN_SENDER};

// ── Wire format ─────────────────────────────────────────────────────

/// Inbound bot activity. Only the fields the intake needs.
#[derive(Debug, Deserialize)]
pub struct ActivityPayload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub from: Option<ActivitySender>,
}

#[derive(Debug, Deserialize)]
pub struct ActivitySender {
    #[serde(default)]
    pub name: Option<String>,
}

impl ActivityPayload {
    pub fn into_message(self) -> IntakeMessage {
        let sender_name = self
            .from
            .and_then(|f| f.name)
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string());
        IntakeMessage::new(self.text.unwrap_or_default(), sender_name)
    }
}

/// Outbound reply: `{ "type": "message", "text": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotReply {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl BotReply {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            kind: "message".to_string(),
            text: text.into(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

/// Turns inbound messages into replies, scheduling ticket pipelines as needed.
#[derive(Clone)]
pub struct IntakeHandler {
    pipeline: Arc<TicketPipeline>,
    runner: PipelineRunner,
}

impl IntakeHandler {
    pub fn new(pipeline: Arc<TicketPipeline>, runner: PipelineRunner) -> Self {
        Self { pipeline, runner }
    }

    pub fn runner(&self) -> &PipelineRunner {
        &self.runner
    }

    /// Handle one message. Never fails: errors become the apology text.
    pub fn handle(&self, message: IntakeMessage) -> String {
        match self.try_handle(message) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Error processing message");
                APOLOGY_TEXT.to_string()
            }
        }
    }

    /// Parse a raw request body and handle it.
    ///
    /// A body that does not parse is answered with the apology text.
    pub fn handle_payload(&self, body: &[u8]) -> BotReply {
        match serde_json::from_slice::<ActivityPayload>(body) {
            Ok(payload) => BotReply::message(self.handle(payload.into_message())),
            Err(e) => {
                let e = IntakeError::from(e);
                error!(error = %e, "Error processing message");
                BotReply::message(APOLOGY_TEXT)
            }
        }
    }

    fn try_handle(&self, message: IntakeMessage) -> Result<String, IntakeError> {
        let IntakeMessage {
            raw_text,
            sender_name,
        } = message;

        match dispatch(&raw_text) {
            Command::CreateTicket(description) => {
                let ticket_id = self.submit(description, sender_name)?;
                Ok(format!(
                    "✅ Ticket {ticket_id} has been created. Our support team will get back to you soon!"
                ))
            }
            Command::FreeformTicket(description) => {
                let ticket_id = self.submit(description, sender_name)?;
                Ok(format!(
                    "✅ Ticket {ticket_id} is being processed. Our support team will get back to you soon!"
                ))
            }
            command => {
                debug!(command = ?command, sender = %sender_name, "Answering built-in command");
                Ok(command.canned_reply().unwrap_or(APOLOGY_TEXT).to_string())
            }
        }
    }

    /// Assign a ticket ID and schedule its pipeline run.
    fn submit(&self, description: String, sender_name: String) -> Result<TicketId, IntakeError> {
        let ticket_id = TicketId::generate();
        let pipeline = Arc::clone(&self.pipeline);
        let run_id = ticket_id.clone();

        self.runner.spawn(ticket_id.as_str(), async move {
            pipeline.run(&description, &sender_name, run_id).await;
        })?;

        info!(ticket_id = %ticket_id, "Ticket created, pipeline scheduled");
        Ok(ticket_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use regex::Regex;

    use crate::channels::Notifier;
    use crate::error::{ChannelError, LlmError};
    use crate::intake::commands::{GREETING_TEXT, HELP_TEXT, MISSING_DESCRIPTION_TEXT, STATUS_TEXT};
    use crate::llm::provider::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};
    use crate::pipeline::classifier::TicketClassifier;
    use crate::pipeline::router::{RoutingTable, TicketRouter};
    use crate::pipeline::types::{Category, NotificationPayload};

    struct StubLlm;

    #[async_trait]
    impl LlmProvider for StubLlm {
        fn model_name(&self) -> &str {
            "stub"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: "Technology".to_string(),
                finish_reason: FinishReason::Stop,
            })
        }
    }

    /// Records payloads; fails delivery when the description contains "fail".
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<NotificationPayload>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn deliver(&self, payload: &NotificationPayload) -> Result<(), ChannelError> {
            self.sent.lock().unwrap().push(payload.clone());
            if payload.body.contains("fail") {
                return Err(ChannelError::SendFailed {
                    name: "recording".into(),
                    reason: "simulated".into(),
                });
            }
            Ok(())
        }
    }

    fn handler() -> (IntakeHandler, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = TicketPipeline::new(
            TicketClassifier::new(Arc::new(StubLlm), Duration::from_secs(5)),
            TicketRouter::new(RoutingTable::new(
                [(Category::Technology, "tech@corp.test".to_string())],
                "support@corp.test",
            )),
            notifier.clone(),
        );
        let handler = IntakeHandler::new(Arc::new(pipeline), PipelineRunner::new(4));
        (handler, notifier)
    }

    fn ticket_id_in(text: &str) -> String {
        let re = Regex::new(r"TKT-\d{14}").unwrap();
        re.find(text).expect("ack should embed a ticket id").as_str().to_string()
    }

    #[tokio::test]
    async fn greeting_schedules_nothing() {
        let (handler, _) = handler();
        for text in ["hi", "Hello", " HI "] {
            assert_eq!(handler.handle(IntakeMessage::new(text, "Alice")), GREETING_TEXT);
        }
        assert_eq!(handler.runner().submitted(), 0);
    }

    #[tokio::test]
    async fn help_and_status_are_canned() {
        let (handler, _) = handler();
        assert_eq!(handler.handle(IntakeMessage::new("HELP", "Alice")), HELP_TEXT);
        assert_eq!(
            handler.handle(IntakeMessage::new("check status", "Alice")),
            STATUS_TEXT
        );
        assert_eq!(handler.runner().submitted(), 0);
    }

    #[tokio::test]
    async fn empty_create_ticket_is_validation_only() {
        let (handler, notifier) = handler();
        let reply = handler.handle(IntakeMessage::new("Create Ticket ", "Alice"));
        assert_eq!(reply, MISSING_DESCRIPTION_TEXT);
        assert!(!reply.contains("TKT-"));
        assert_eq!(handler.runner().submitted(), 0);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_ticket_acknowledges_and_runs_pipeline() {
        let (handler, notifier) = handler();
        let reply = handler.handle(IntakeMessage::new("Create Ticket printer is broken", "Alice"));

        let ticket_id = ticket_id_in(&reply);
        assert!(reply.contains("has been created"));
        assert_eq!(handler.runner().submitted(), 1);

        handler.runner().wait_idle().await;
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, format!("Support Ticket {ticket_id}"));
        assert!(sent[0].body.contains("Description: printer is broken\n"));
        assert!(sent[0].body.contains("From: Alice"));
        assert_eq!(sent[0].to_address, "tech@corp.test");
    }

    #[tokio::test]
    async fn freeform_text_becomes_ticket() {
        let (handler, notifier) = handler();
        let reply = handler.handle(IntakeMessage::new("my monitor is flickering", "Bob"));

        ticket_id_in(&reply);
        assert!(reply.contains("is being processed"));

        handler.runner().wait_idle().await;
        let sent = notifier.sent.lock().unwrap();
        assert!(sent[0].body.contains("Description: my monitor is flickering"));
    }

    #[tokio::test]
    async fn concurrent_tickets_are_independent() {
        let (handler, notifier) = handler();
        let first = handler.handle(IntakeMessage::new("Create Ticket please fail this one", "Ann"));
        let second = handler.handle(IntakeMessage::new(
            "Create Ticket keyboard missing keys",
            "Ben",
        ));

        ticket_id_in(&first);
        ticket_id_in(&second);
        assert_eq!(handler.runner().submitted(), 2);

        assert!(handler.runner().shutdown(Duration::from_secs(5)).await);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().any(|p| p.body.contains("From: Ann")));
        assert!(sent.iter().any(|p| p.body.contains("From: Ben")));
        // Acks were already returned and are unaffected by the failed delivery.
        assert!(first.contains("has been created"));
        assert!(second.contains("has been created"));
    }

    #[tokio::test]
    async fn closed_runner_yields_apology() {
        let (handler, _) = handler();
        handler.runner().shutdown(Duration::from_millis(10)).await;
        assert_eq!(
            handler.handle(IntakeMessage::new("Create Ticket late ticket", "Zed")),
            APOLOGY_TEXT
        );
    }

    #[tokio::test]
    async fn payload_parsing_defaults_and_errors() {
        let (handler, _) = handler();

        let reply =
            handler.handle_payload(br#"{"text": "check status", "from": {"name": "Alice"}}"#);
        assert_eq!(reply, BotReply::message(STATUS_TEXT));

        let reply = handler.handle_payload(br#"{"from": {"name": "Alice"}}"#);
        assert_eq!(reply.text, "Please provide a description of your issue.");

        let reply = handler.handle_payload(b"not json");
        assert_eq!(reply, BotReply::message(APOLOGY_TEXT));

        let reply = handler.handle_payload(br#"{"text": 42}"#);
        assert_eq!(reply.text, APOLOGY_TEXT);
    }

    #[test]
    fn missing_sender_uses_placeholder() {
        let payload: ActivityPayload = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert_eq!(payload.into_message().sender_name, UNKNOWN_SENDER);
    }

    #[test]
    fn reply_serializes_with_type_field() {
        let json = serde_json::to_value(BotReply::message("ok")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "message", "text": "ok"}));
    }
}
