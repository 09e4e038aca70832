//! The error taxonomy crossing the service boundary.
//!
//! Validation and conflict errors carry user-facing messages; transient
//! errors have already been retried by the time a caller sees one.

use uuid::Uuid;

#[derive(Debug)]
pub enum MarketError {
    /// Rejected before any write: self-claim, over-claim, non-owner call.
    /// `remaining_milli` is populated for over-claims so the caller can
    /// resubmit a smaller request.
    Validation {
        reason: String,
        remaining_milli: Option<i64>,
    },
    /// Listing or order does not exist.
    NotFound { entity: &'static str, id: Uuid },
    /// The entity is in a state that does not admit the request: lost
    /// reservation race, illegal status transition, delete of a non-active
    /// listing.
    Conflict { detail: String },
    /// Storage-layer contention that survived the bounded retry. Safe to
    /// re-issue the same request.
    Transient { detail: String },
    /// Anything else from the persistence layer.
    Storage(anyhow::Error),
}

impl MarketError {
    pub(crate) fn conflict(detail: impl Into<String>) -> Self {
        Self::Conflict { detail: detail.into() }
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
            remaining_milli: None,
        }
    }
}

impl std::fmt::Display for MarketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { reason, .. } => write!(f, "validation: {reason}"),
            Self::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            Self::Conflict { detail } => write!(f, "conflict: {detail}"),
            Self::Transient { detail } => write!(f, "transient storage failure: {detail}"),
            Self::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for MarketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => e.source(),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for MarketError {
    fn from(e: anyhow::Error) -> Self {
        Self::Storage(e)
    }
}
