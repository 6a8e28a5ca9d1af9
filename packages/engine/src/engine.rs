//! Typed handle over the queue actor.

use std::sync::Arc;
use std::time::Duration;

use db::repositories::TicketRepository;
use ractor::rpc::CallResult;
use ractor::{Actor, ActorRef, RpcReplyPort};
use ticket_core::{
    Clock, CreatedTicket, DayEpoch, NationalId, QueueError, QueueEvent, QueueStatus, Ticket,
    TicketId,
};
use tokio::sync::broadcast;

use crate::messages::QueueMessage;
use crate::queue_actor::{QueueActor, QueueActorState};

/// Per-operation deadline; the engine does bounded synchronous work, so
/// hitting this means the actor is gone or the store is wedged.
const CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to the running queue engine.
///
/// Cloneable; all clones talk to the same actor. Mutations go through
/// the actor, `status` reads the store directly.
#[derive(Clone)]
pub struct QueueEngine {
    actor: ActorRef<QueueMessage>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<QueueEvent>,
}

impl QueueEngine {
    /// Read model: today's current/waiting/completed tickets.
    ///
    /// Runs concurrently with transitions; the snapshot is consistent
    /// because it is a single store call. No side effects.
    pub async fn status(&self) -> Result<QueueStatus, QueueError> {
        let epoch = DayEpoch::containing(self.clock.now());
        TicketRepository::status(epoch)
            .await
            .map_err(|e| QueueError::StoreUnavailable(e.to_string()))
    }

    /// Validate input and enqueue a new ticket.
    ///
    /// Fails with `Validation` on malformed input, `DuplicateActiveEntry`
    /// if the identity already has an active ticket today.
    pub async fn create_ticket(
        &self,
        national_id: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<CreatedTicket, QueueError> {
        let national_id = NationalId::parse(national_id)?;
        let first_name = first_name.trim();
        if first_name.is_empty() {
            return Err(QueueError::Validation("first name is required".into()));
        }
        let last_name = last_name.trim();
        if last_name.is_empty() {
            return Err(QueueError::Validation("last name is required".into()));
        }

        let first_name = first_name.to_string();
        let last_name = last_name.to_string();
        self.call(|reply| QueueMessage::CreateTicket {
            national_id,
            first_name,
            last_name,
            reply,
        })
        .await
    }

    /// Complete the current ticket (if any) and call the next waiting one.
    ///
    /// Fails with `EmptyQueue`, leaving state unchanged, when nobody waits.
    pub async fn call_next(&self) -> Result<Ticket, QueueError> {
        self.call(|reply| QueueMessage::CallNext { reply }).await
    }

    /// Complete the current ticket. Fails with `NoCurrentPatient` if none.
    pub async fn finish_current(&self) -> Result<Ticket, QueueError> {
        self.call(|reply| QueueMessage::FinishCurrent { reply })
            .await
    }

    /// Send the current ticket to the back of the line with a new number.
    /// Fails with `NoCurrentPatient` if none.
    pub async fn skip(&self) -> Result<Ticket, QueueError> {
        self.call(|reply| QueueMessage::Skip { reply }).await
    }

    /// Pull a ticket back to the desk, completing any current one first.
    /// Fails with `NotFound` if the id is not in today's epoch.
    pub async fn recall(&self, ticket_id: TicketId) -> Result<Ticket, QueueError> {
        self.call(|reply| QueueMessage::Recall { ticket_id, reply })
            .await
    }

    /// Subscribe to queue events.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    /// Stop the engine actor.
    pub fn shutdown(&self) {
        let _ = self.actor.send_message(QueueMessage::Shutdown);
    }

    async fn call<T: Send + 'static>(
        &self,
        msg: impl FnOnce(RpcReplyPort<Result<T, QueueError>>) -> QueueMessage,
    ) -> Result<T, QueueError> {
        let result = ractor::rpc::call(&self.actor, msg, Some(CALL_TIMEOUT))
            .await
            .map_err(|e| QueueError::Engine(e.to_string()))?;

        match result {
            CallResult::Success(outcome) => outcome,
            CallResult::Timeout => Err(QueueError::Engine("operation timed out".into())),
            CallResult::SenderError => Err(QueueError::Engine("engine dropped the request".into())),
        }
    }
}

/// Spawn the queue actor and return a handle to it.
pub async fn start_engine(
    clock: Arc<dyn Clock>,
) -> Result<(QueueEngine, tokio::task::JoinHandle<()>), ractor::SpawnErr> {
    let (event_tx, _) = broadcast::channel(256);
    let state = QueueActorState::new(clock.clone(), event_tx.clone());

    let (actor, handle) = Actor::spawn(None, QueueActor, state).await?;

    Ok((
        QueueEngine {
            actor,
            clock,
            events: event_tx,
        },
        handle,
    ))
}
