//! Shared types for the ticket pipeline.

use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

// ── Inbound message ─────────────────────────────────────────────────

/// Sender label used when the inbound payload carries no name.
pub const UNKNOWN_SENDER: &str = "Unknown User";

/// One inbound chat message, built per request and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeMessage {
    /// Message text as typed by the user.
    pub raw_text: String,
    /// Display name of the sender.
    pub sender_name: String,
}

impl IntakeMessage {
    pub fn new(raw_text: impl Into<String>, sender_name: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            sender_name: sender_name.into(),
        }
    }
}

// ── Category ────────────────────────────────────────────────────────

/// Department a ticket is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Training,
    ItOperations,
    Technology,
    Hr,
    Finance,
    Sales,
}

impl Category {
    /// Every category, in prompt order.
    pub const ALL: [Category; 6] = [
        Category::Training,
        Category::ItOperations,
        Category::Technology,
        Category::Hr,
        Category::Finance,
        Category::Sales,
    ];

    /// Category used whenever classification cannot produce a valid label.
    pub const DEFAULT: Category = Category::Training;

    /// Label the model is asked to answer with.
    pub fn label(self) -> &'static str {
        match self {
            Category::Training => "Training",
            Category::ItOperations => "IT Operations",
            Category::Technology => "Technology",
            Category::Hr => "HR",
            Category::Finance => "Finance",
            Category::Sales => "Sales",
        }
    }

    /// Environment variable holding this category's mailbox.
    pub fn env_key(self) -> &'static str {
        match self {
            Category::Training => "TRAINING_EMAIL",
            Category::ItOperations => "IT_OPS_EMAIL",
            Category::Technology => "TECH_EMAIL",
            Category::Hr => "HR_EMAIL",
            Category::Finance => "FINANCE_EMAIL",
            Category::Sales => "SALES_EMAIL",
        }
    }

    /// Exact label match. Anything else is not a category.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Ticket ID ───────────────────────────────────────────────────────

/// Display label for a ticket: `TKT-<yyyyMMddHHmmss>`.
///
/// Built from wall-clock seconds, so two tickets created within the same
/// second share an ID. It is a correlation label, never a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TicketId(String);

impl TicketId {
    /// Generate an ID from the current local time.
    pub fn generate() -> Self {
        Self::at(&Local::now())
    }

    /// Generate an ID for a given instant.
    pub fn at<Tz: TimeZone>(time: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self(format!("TKT-{}", time.format("%Y%m%d%H%M%S")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Notification ────────────────────────────────────────────────────

/// A single outbound notification. Built fresh for each ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub subject: String,
    pub body: String,
    pub to_address: String,
}

impl NotificationPayload {
    /// Build the department notification for a classified ticket.
    pub fn for_ticket(
        ticket_id: &TicketId,
        category: Category,
        sender_name: &str,
        description: &str,
        to_address: impl Into<String>,
    ) -> Self {
        let body = format!(
            "New Ticket: {ticket_id}\n\
             Category: {category}\n\
             From: {sender_name}\n\
             Description: {description}\n"
        );
        Self {
            subject: format!("Support Ticket {ticket_id}"),
            body,
            to_address: to_address.into(),
        }
    }
}
