//! Inbound message intake: command dispatch, handler, HTTP routes.

pub mod auth;
pub mod commands;
pub mod handler;
pub mod routes;

pub use auth::AuthPolicy;
pub use commands::{Command, dispatch};
pub use handler::{BotReply, IntakeHandler};
pub use routes::intake_routes;
