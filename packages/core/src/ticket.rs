//! Ticket domain types for queue entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::QueueError;

/// Unique identifier for a ticket, using ULID for chronological sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub Ulid);

impl TicketId {
    /// Create a new unique ticket ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a ticket ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated national identity number (11 digits).
///
/// Not unique across days; uniqueness among *active* tickets within one
/// day is enforced by the engine, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NationalId(String);

impl NationalId {
    /// Validate and wrap a raw identity string.
    pub fn parse(raw: &str) -> Result<Self, QueueError> {
        let raw = raw.trim();
        if raw.len() != 11 {
            return Err(QueueError::Validation(
                "national ID must be exactly 11 digits".into(),
            ));
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(QueueError::Validation(
                "national ID must contain only digits".into(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NationalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current state of a ticket in its lifecycle.
///
/// The full transition graph is owned by the engine: `Waiting -> Called`
/// (call-next), `Called -> Completed` (finish, or displacement by
/// call-next/recall), `Called -> Waiting` (skip, with a fresh number),
/// and `Completed -> Called` (recall only).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketState {
    /// Ticket is in line, not yet served.
    #[default]
    Waiting,
    /// Ticket is currently being served. At most one per day.
    Called,
    /// Ticket was served (or displaced). Terminal except for recall.
    Completed,
}

impl TicketState {
    /// Active tickets count toward the duplicate-entry rule.
    pub fn is_active(&self) -> bool {
        matches!(self, TicketState::Waiting | TicketState::Called)
    }

    /// Get a simple state string for display and queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketState::Waiting => "waiting",
            TicketState::Called => "called",
            TicketState::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TicketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ticket represents one patient's place in the day's queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier for this ticket.
    pub id: TicketId,
    /// The patient's national identity number.
    pub national_id: NationalId,
    /// Patient first name.
    pub first_name: String,
    /// Patient last name.
    pub last_name: String,
    /// Queue number, unique within the day and never reused. A skipped
    /// ticket keeps its identity but gets a fresh, higher number.
    pub number: u32,
    /// Current state.
    pub state: TicketState,
    /// Local calendar day the ticket belongs to.
    pub day: NaiveDate,
    /// When the ticket was created.
    pub created_at: DateTime<Utc>,
    /// When the ticket was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Create a new waiting ticket with an already-allocated number.
    pub fn new(
        national_id: NationalId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        number: u32,
        day: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TicketId::new(),
            national_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            number,
            state: TicketState::Waiting,
            day,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full display name, for operator consoles and boards.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Read model of today's queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// The at-most-one ticket currently being served.
    pub current: Option<Ticket>,
    /// Waiting tickets, ascending by number.
    pub waiting: Vec<Ticket>,
    /// Completed tickets, most recent number first.
    pub completed: Vec<Ticket>,
}

impl QueueStatus {
    /// Total tickets seen today.
    pub fn total(&self) -> usize {
        self.current.iter().len() + self.waiting.len() + self.completed.len()
    }
}

/// Result of creating a ticket: the record plus its advisory position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedTicket {
    pub ticket: Ticket,
    /// 1-based rank among currently waiting tickets. Best-effort: by the
    /// time a client renders it, earlier tickets may have been called.
    pub position: u32,
}
