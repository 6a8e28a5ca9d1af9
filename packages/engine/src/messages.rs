//! Message types for the queue actor.

use ractor::RpcReplyPort;
use ticket_core::{CreatedTicket, NationalId, QueueError, Ticket, TicketId};

/// Messages for the QueueActor.
///
/// One message per mutating operation; each carries a reply port with a
/// typed business result. Reads don't go through the actor.
pub enum QueueMessage {
    /// Create a ticket at the back of today's queue.
    CreateTicket {
        national_id: NationalId,
        first_name: String,
        last_name: String,
        reply: RpcReplyPort<Result<CreatedTicket, QueueError>>,
    },

    /// Complete the current ticket (if any) and call the next waiting one.
    CallNext {
        reply: RpcReplyPort<Result<Ticket, QueueError>>,
    },

    /// Complete the current ticket without advancing the queue.
    FinishCurrent {
        reply: RpcReplyPort<Result<Ticket, QueueError>>,
    },

    /// Send the current ticket to the back of the line with a new number.
    Skip {
        reply: RpcReplyPort<Result<Ticket, QueueError>>,
    },

    /// Pull a specific ticket (typically completed) back to the desk.
    Recall {
        ticket_id: TicketId,
        reply: RpcReplyPort<Result<Ticket, QueueError>>,
    },

    /// Shutdown the engine gracefully.
    Shutdown,
}
