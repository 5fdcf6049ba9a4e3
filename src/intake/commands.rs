//! Command dispatch: turns message text into exactly one command.
//!
//! Every keyword is ASCII and matched with ASCII case folding only. Non-ASCII
//! characters never fold into a command.

/// Prefix that explicitly requests a ticket.
const CREATE_TICKET_PREFIX: &str = "create ticket";

pub const GREETING_TEXT: &str = "👋 Hi! I'm your support assistant. How can I help you today?";

pub const HELP_TEXT: &str = "Available commands:\n\
• Hi - Say hello\n\
• Help - Show this help message\n\
• Create Ticket <description> - Create a new support ticket\n\
• Check Status - Check system status";

pub const STATUS_TEXT: &str = "✅ All systems are operational. Ready to assist you!";

pub const EMPTY_MESSAGE_TEXT: &str = "Please provide a description of your issue.";

pub const MISSING_DESCRIPTION_TEXT: &str = "Please provide a description for your ticket.";

pub const APOLOGY_TEXT: &str = "I encountered an error. Please try again.";

/// The decision made for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Greeting,
    Help,
    StatusCheck,
    /// `create ticket <description>`; description is trimmed and non-empty.
    CreateTicket(String),
    /// Any other text, taken whole as the description.
    FreeformTicket(String),
    /// Nothing but whitespace.
    EmptyMessage,
    /// `create ticket` with nothing after it.
    MissingDescription,
}

impl Command {
    /// Fixed reply for commands that do not create a ticket.
    pub fn canned_reply(&self) -> Option<&'static str> {
        match self {
            Command::Greeting => Some(GREETING_TEXT),
            Command::Help => Some(HELP_TEXT),
            Command::StatusCheck => Some(STATUS_TEXT),
            Command::EmptyMessage => Some(EMPTY_MESSAGE_TEXT),
            Command::MissingDescription => Some(MISSING_DESCRIPTION_TEXT),
            Command::CreateTicket(_) | Command::FreeformTicket(_) => None,
        }
    }

    /// Ticket description, for the two ticket-creating commands.
    pub fn description(&self) -> Option<&str> {
        match self {
            Command::CreateTicket(d) | Command::FreeformTicket(d) => Some(d),
            _ => None,
        }
    }
}

/// Classify message text into a command. Total: every input maps somewhere.
pub fn dispatch(raw_text: &str) -> Command {
    let text = raw_text.trim();
    if text.is_empty() {
        return Command::EmptyMessage;
    }

    match text.to_ascii_lowercase().as_str() {
        "hi" | "hello" => return Command::Greeting,
        "help" => return Command::Help,
        "check status" => return Command::StatusCheck,
        _ => {}
    }

    let prefix_len = CREATE_TICKET_PREFIX.len();
    if text
        .get(..prefix_len)
        .is_some_and(|p| p.eq_ignore_ascii_case(CREATE_TICKET_PREFIX))
    {
        let description = text[prefix_len..].trim();
        return if description.is_empty() {
            Command::MissingDescription
        } else {
            Command::CreateTicket(description.to_string())
        };
    }

    Command::FreeformTicket(text.to_string())
}
