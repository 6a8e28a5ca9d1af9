//! Event types for real-time updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Ticket, TicketId};

/// Events emitted by the queue engine after each successful transition.
///
/// Push transports subscribe to these; the reference transport remains
/// polling, so events carry enough detail to log but clients are not
/// required to consume them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QueueEvent {
    /// A new ticket entered the waiting line.
    TicketCreated {
        ticket: Ticket,
        position: u32,
        timestamp: DateTime<Utc>,
    },
    /// A ticket was called to the desk.
    TicketCalled {
        ticket_id: TicketId,
        number: u32,
        timestamp: DateTime<Utc>,
    },
    /// A ticket was completed, explicitly or by displacement.
    TicketCompleted {
        ticket_id: TicketId,
        number: u32,
        timestamp: DateTime<Utc>,
    },
    /// The current ticket was sent to the back of the line.
    TicketSkipped {
        ticket_id: TicketId,
        old_number: u32,
        new_number: u32,
        timestamp: DateTime<Utc>,
    },
    /// A ticket was pulled back to the desk, typically from completed.
    TicketRecalled {
        ticket_id: TicketId,
        number: u32,
        timestamp: DateTime<Utc>,
    },
}

impl QueueEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            QueueEvent::TicketCreated { timestamp, .. } => *timestamp,
            QueueEvent::TicketCalled { timestamp, .. } => *timestamp,
            QueueEvent::TicketCompleted { timestamp, .. } => *timestamp,
            QueueEvent::TicketSkipped { timestamp, .. } => *timestamp,
            QueueEvent::TicketRecalled { timestamp, .. } => *timestamp,
        }
    }

    /// Get the ticket ID associated with this event.
    pub fn ticket_id(&self) -> TicketId {
        match self {
            QueueEvent::TicketCreated { ticket, .. } => ticket.id,
            QueueEvent::TicketCalled { ticket_id, .. } => *ticket_id,
            QueueEvent::TicketCompleted { ticket_id, .. } => *ticket_id,
            QueueEvent::TicketSkipped { ticket_id, .. } => *ticket_id,
            QueueEvent::TicketRecalled { ticket_id, .. } => *ticket_id,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            QueueEvent::TicketCreated {
                ticket, position, ..
            } => format!(
                "Ticket #{} created for {} (position {})",
                ticket.number,
                ticket.display_name(),
                position
            ),
            QueueEvent::TicketCalled { number, .. } => {
                format!("Ticket #{} called", number)
            }
            QueueEvent::TicketCompleted { number, .. } => {
                format!("Ticket #{} completed", number)
            }
            QueueEvent::TicketSkipped {
                old_number,
                new_number,
                ..
            } => format!("Ticket #{} skipped to back as #{}", old_number, new_number),
            QueueEvent::TicketRecalled { number, .. } => {
                format!("Ticket #{} recalled", number)
            }
        }
    }
}
