//! Ticket pipeline: classify, route, notify.
//!
//! Flow:
//! 1. Classification (LLM, falls back to the default category)
//! 2. Routing (static table lookup)
//! 3. Notification (department mailbox)
//!
//! A run is best-effort: nothing is retried and nothing is reported back to
//! the user, who already received an acknowledgment.

use std::sync::Arc;

use tracing::{error, info};

use crate::channels::Notifier;
use crate::pipeline::classifier::{Classification, TicketClassifier};
use crate::pipeline::router::TicketRouter;
use crate::pipeline::types::{NotificationPayload, TicketId};

/// What a single pipeline run did. Used for logging and tests only.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub ticket_id: TicketId,
    pub classification: Classification,
    pub to_address: String,
    pub notified: bool,
}

/// Orchestrates classify → route → notify for one ticket.
pub struct TicketPipeline {
    classifier: TicketClassifier,
    router: TicketRouter,
    notifier: Arc<dyn Notifier>,
}

impl TicketPipeline {
    pub fn new(
        classifier: TicketClassifier,
        router: TicketRouter,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            classifier,
            router,
            notifier,
        }
    }

    /// Process one ticket end to end.
    pub async fn run(
        &self,
        description: &str,
        sender_name: &str,
        ticket_id: TicketId,
    ) -> PipelineOutcome {
        info!(
            ticket_id = %ticket_id,
            sender = %sender_name,
            "Processing ticket"
        );

        let classification = self.classifier.classify_detailed(description).await;
        let category = classification.category();

        let to_address = self.router.route(category).to_string();

        let payload = NotificationPayload::for_ticket(
            &ticket_id,
            category,
            sender_name,
            description,
            to_address.clone(),
        );

        let notified = self.notifier.send(&payload).await;
        if notified {
            info!(
                ticket_id = %ticket_id,
                category = %category,
                to = %to_address,
                "Ticket processed"
            );
        } else {
            error!(
                ticket_id = %ticket_id,
                category = %category,
                to = %to_address,
                "Ticket notification was not delivered"
            );
        }

        PipelineOutcome {
            ticket_id,
            classification,
            to_address,
            notified,
        }
    }
}
