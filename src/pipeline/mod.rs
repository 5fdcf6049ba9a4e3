//! Ticket pipeline: classification, routing, notification.

pub mod classifier;
pub mod processor;
pub mod router;
pub mod runner;
pub mod types;

pub use classifier::{Classification, FallbackReason, TicketClassifier};
pub use processor::{PipelineOutcome, TicketPipeline};
pub use router::{RoutingTable, TicketRouter};
pub use runner::PipelineRunner;
pub use types::{Category, IntakeMessage, NotificationPayload, TicketId};
