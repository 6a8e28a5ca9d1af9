//! Repository layer for database operations.

mod ticket_repo;

pub use ticket_repo::TicketRepository;
