//! Queue engine for the clinic ticket system.
//!
//! This crate implements the ticket-queue state machine on top of the
//! ticket store:
//!
//! - `QueueActor` - Ractor actor that serializes all mutating
//!   transitions, making each one atomic with respect to the others
//! - `QueueEngine` - typed handle exposing the operations to callers
//! - `spawn_status_poller` - interval task feeding display clients
//!
//! Reads (`QueueEngine::status`) bypass the actor and hit the store
//! directly as a single transactional query.
//!
//! Callers of the mutating operations are assumed to be authenticated
//! staff; access control sits outside this crate.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use engine::start_engine;
//! use ticket_core::SystemClock;
//!
//! let (engine, _handle) = start_engine(Arc::new(SystemClock)).await?;
//! let created = engine.create_ticket("12345678901", "Ada", "Lovelace").await?;
//! let called = engine.call_next().await?;
//! ```

mod engine;
mod messages;
mod poller;
mod queue_actor;

pub use engine::{QueueEngine, start_engine};
pub use messages::QueueMessage;
pub use poller::{DEFAULT_POLL_INTERVAL, StatusFrame, spawn_status_poller};
pub use queue_actor::{QueueActor, QueueActorState};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, concurrency};
