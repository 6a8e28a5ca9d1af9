//! Business error taxonomy for queue operations.

use thiserror::Error;

use crate::TicketId;

/// Errors returned by queue operations.
///
/// All variants except `StoreUnavailable` and `Engine` are expected,
/// user-facing business conditions: they are returned as typed results
/// and recovered by the caller (re-prompt, refresh), never treated as
/// faults.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueueError {
    /// Malformed input; the caller should re-prompt.
    #[error("{0}")]
    Validation(String),

    /// The identity already has an active (waiting or called) ticket today.
    #[error("you already have an active queue entry for today")]
    DuplicateActiveEntry,

    /// Call-next with nobody waiting.
    #[error("no patients in the waiting queue")]
    EmptyQueue,

    /// Finish or skip with nobody being served.
    #[error("no patient is currently being served")]
    NoCurrentPatient,

    /// The ticket id does not resolve within today's epoch.
    #[error("ticket not found: {0}")]
    NotFound(TicketId),

    /// Infrastructure fault in the ticket store.
    #[error("ticket store unavailable: {0}")]
    StoreUnavailable(String),

    /// The engine actor is not running or dropped the request.
    #[error("queue engine unavailable: {0}")]
    Engine(String),
}

impl QueueError {
    /// Whether this is an expected business condition rather than a fault.
    pub fn is_business(&self) -> bool {
        !matches!(
            self,
            QueueError::StoreUnavailable(_) | QueueError::Engine(_)
        )
    }
}
