//! Error types for the auth core.
//!
//! ERROR HANDLING
//! ==============
//! Nothing in the session subsystem is fatal. Remote failures become
//! [`AuthError`] values returned to the caller; storage failures become
//! [`StorageError`] values that the session store logs and recovers from by
//! clearing state. Callers never see a panic or a raw transport error type.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use crate::net::codes;

/// Failure of a remote auth operation, as seen by views.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The request never produced a usable response (network, timeout, body parse).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The backend answered with a non-success business code.
    #[error("rejected with code {code}: {message}")]
    Rejected { code: i64, message: String },

    /// A success envelope arrived without the payload the operation needs.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The operation needs an active session of the relevant kind.
    #[error("not logged in")]
    NotLoggedIn,
}

impl AuthError {
    /// Build a rejection, falling back to the built-in message table when the
    /// server sent an empty message.
    #[must_use]
    pub fn rejected(code: i64, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| codes::default_message(code).to_owned());
        Self::Rejected { code, message }
    }

    /// Stable machine-readable code for logs and UI branching.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_TRANSPORT",
            Self::Rejected { .. } => "E_REJECTED",
            Self::MalformedResponse(_) => "E_MALFORMED_RESPONSE",
            Self::NotLoggedIn => "E_NOT_LOGGED_IN",
        }
    }

    /// User-facing text for the failure.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Transport(detail) if detail.trim().is_empty() => codes::NETWORK_ERROR.to_owned(),
            Self::Transport(detail) => detail.clone(),
            Self::Rejected { message, .. } => message.clone(),
            Self::MalformedResponse(_) => codes::UNKNOWN_ERROR.to_owned(),
            Self::NotLoggedIn => codes::NOT_LOGGED_IN.to_owned(),
        }
    }
}

/// Failure reading or writing the persistent key-value store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The storage backend is missing or refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A persisted value could not be decoded.
    #[error("corrupt value under `{key}`: {reason}")]
    Corrupt { key: String, reason: String },
}
