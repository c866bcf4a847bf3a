//! Error types for a3s-audit

use thiserror::Error;

/// Errors that can occur while building or tracing audit events
#[derive(Debug, Error)]
pub enum AuditError {
    /// No event request was supplied to build/trace
    #[error("Event request is required")]
    MissingEvent,

    /// A display-name read or detail mapping failed against the subject
    #[error("Cannot resolve subject of kind '{kind}': {reason}")]
    UnresolvedSubject {
        kind: String,
        reason: String,
    },

    /// A required detail field is missing
    ///
    /// Advisory only: the core never blocks persistence on it.
    #[error("'details.{field}' is required for event type '{event_type}'")]
    Validation {
        event_type: String,
        field: String,
    },

    /// Persistence sink failure, propagated untouched
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AuditError {
    /// Build an `UnresolvedSubject` error for a subject kind
    pub fn unresolved(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnresolvedSubject {
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;
