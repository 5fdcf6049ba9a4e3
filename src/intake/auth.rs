//! Inbound request verification.
//!
//! No signature verification is performed. By default every request is
//! accepted and a missing Bearer token is only logged. `RequireBearer` rejects
//! requests that carry no Bearer token at all.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use tracing::{debug, warn};

use crate::error::IntakeError;

/// How strictly inbound requests are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPolicy {
    /// Accept everything; log when the Bearer token is missing.
    #[default]
    Permissive,
    /// Reject requests without an `Authorization: Bearer ...` header.
    RequireBearer,
}

/// Extract the Bearer token from request headers, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Check an inbound request against the policy.
pub fn verify_request(headers: &HeaderMap, policy: AuthPolicy) -> Result<(), IntakeError> {
    match (bearer_token(headers), policy) {
        (Some(_), _) => {
            debug!("Bearer token present (signature not verified)");
            Ok(())
        }
        (None, AuthPolicy::Permissive) => {
            warn!("No Bearer token found, accepting request");
            Ok(())
        }
        (None, AuthPolicy::RequireBearer) => {
            warn!("No Bearer token found, rejecting request");
            Err(IntakeError::Unauthorized("missing Bearer token".to_string()))
        }
    }
}
