//! Core domain types for the clinic ticket queue.
//!
//! This crate contains shared types used across all packages:
//! - Ticket and TicketState for queue entries
//! - DayEpoch and Clock for day-scoped queries
//! - QueueEvent for real-time updates
//! - QueueError, the business error taxonomy

mod epoch;
mod error;
mod events;
mod ticket;

pub use epoch::{Clock, DayEpoch, SystemClock};
pub use error::QueueError;
pub use events::QueueEvent;
pub use ticket::{CreatedTicket, NationalId, QueueStatus, Ticket, TicketId, TicketState};
