//! Queue actor: the single writer for the day's ticket queue.
//!
//! Every mutating transition runs inside `handle`, one message at a
//! time, so multi-step transitions (complete-then-call, allocate-then-
//! insert) are atomic with respect to each other without store-level
//! transactions. The `(day, number)` unique index backstops number
//! allocation against writers outside this process; on a conflict the
//! allocation is retried a bounded number of times.

use std::sync::Arc;

use db::DbError;
use db::repositories::TicketRepository;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use ticket_core::{
    Clock, CreatedTicket, DayEpoch, NationalId, QueueError, QueueEvent, Ticket, TicketState,
};
use tokio::sync::broadcast;

use crate::messages::QueueMessage;

/// Bounded retries for a number allocation that loses a race.
const ALLOC_RETRIES: u32 = 3;

/// State for the queue actor.
pub struct QueueActorState {
    /// Time source; epoch boundaries are derived from it per call.
    clock: Arc<dyn Clock>,
    /// Event broadcaster for push transports.
    event_tx: broadcast::Sender<QueueEvent>,
}

impl QueueActorState {
    /// Create a new queue actor state.
    pub fn new(clock: Arc<dyn Clock>, event_tx: broadcast::Sender<QueueEvent>) -> Self {
        Self { clock, event_tx }
    }

    /// Broadcast an event. Lagging or absent subscribers are not an error.
    fn broadcast(&self, event: QueueEvent) {
        tracing::debug!("{}", event.description());
        let _ = self.event_tx.send(event);
    }

    fn epoch(&self) -> (chrono::DateTime<chrono::Utc>, DayEpoch) {
        let now = self.clock.now();
        (now, DayEpoch::containing(now))
    }

    async fn create_ticket(
        &self,
        national_id: NationalId,
        first_name: String,
        last_name: String,
    ) -> Result<CreatedTicket, QueueError> {
        let (now, epoch) = self.epoch();

        if TicketRepository::find_active_by_national_id(epoch, &national_id)
            .await
            .map_err(store_err)?
            .is_some()
        {
            return Err(QueueError::DuplicateActiveEntry);
        }

        let mut attempt = 0;
        let ticket = loop {
            let number = TicketRepository::max_number(epoch).await.map_err(store_err)? + 1;
            let candidate = Ticket::new(
                national_id.clone(),
                &first_name,
                &last_name,
                number,
                epoch.day,
                now,
            );
            match TicketRepository::create(&candidate).await {
                Ok(ticket) => break ticket,
                Err(DbError::Conflict(msg)) => {
                    attempt += 1;
                    if attempt > ALLOC_RETRIES {
                        return Err(QueueError::StoreUnavailable(msg));
                    }
                    tracing::warn!("ticket number {} taken, reallocating", number);
                }
                Err(e) => return Err(store_err(e)),
            }
        };

        let position = TicketRepository::count_waiting_before(epoch, ticket.number)
            .await
            .map_err(store_err)?
            + 1;

        self.broadcast(QueueEvent::TicketCreated {
            ticket: ticket.clone(),
            position,
            timestamp: now,
        });

        Ok(CreatedTicket { ticket, position })
    }

    async fn call_next(&self) -> Result<Ticket, QueueError> {
        let (now, epoch) = self.epoch();

        // Check the waiting line before touching the current ticket, so
        // an empty queue leaves the desk state unchanged.
        let next = TicketRepository::first_waiting(epoch)
            .await
            .map_err(store_err)?
            .ok_or(QueueError::EmptyQueue)?;

        self.complete_current(epoch, now).await?;

        let called = TicketRepository::update_state(next.id, TicketState::Called, now)
            .await
            .map_err(store_err)?;

        self.broadcast(QueueEvent::TicketCalled {
            ticket_id: called.id,
            number: called.number,
            timestamp: now,
        });

        Ok(called)
    }

    async fn finish_current(&self) -> Result<Ticket, QueueError> {
        let (now, epoch) = self.epoch();

        let current = TicketRepository::find_current(epoch)
            .await
            .map_err(store_err)?
            .ok_or(QueueError::NoCurrentPatient)?;

        let done = TicketRepository::update_state(current.id, TicketState::Completed, now)
            .await
            .map_err(store_err)?;

        self.broadcast(QueueEvent::TicketCompleted {
            ticket_id: done.id,
            number: done.number,
            timestamp: now,
        });

        Ok(done)
    }

    async fn skip(&self) -> Result<Ticket, QueueError> {
        let (now, epoch) = self.epoch();

        let current = TicketRepository::find_current(epoch)
            .await
            .map_err(store_err)?
            .ok_or(QueueError::NoCurrentPatient)?;

        let mut attempt = 0;
        let moved = loop {
            let number = TicketRepository::max_number(epoch).await.map_err(store_err)? + 1;
            match TicketRepository::reassign(current.id, number, now).await {
                Ok(ticket) => break ticket,
                Err(DbError::Conflict(msg)) => {
                    attempt += 1;
                    if attempt > ALLOC_RETRIES {
                        return Err(QueueError::StoreUnavailable(msg));
                    }
                    tracing::warn!("ticket number {} taken, reallocating", number);
                }
                Err(e) => return Err(store_err(e)),
            }
        };

        self.broadcast(QueueEvent::TicketSkipped {
            ticket_id: moved.id,
            old_number: current.number,
            new_number: moved.number,
            timestamp: now,
        });

        Ok(moved)
    }

    async fn recall(&self, ticket_id: ticket_core::TicketId) -> Result<Ticket, QueueError> {
        let (now, epoch) = self.epoch();

        let target = match TicketRepository::get(ticket_id).await {
            Ok(ticket) => ticket,
            Err(DbError::NotFound(_)) => return Err(QueueError::NotFound(ticket_id)),
            Err(e) => return Err(store_err(e)),
        };

        // Prior epochs are invisible to the engine; a stale id is NotFound.
        if !epoch.contains(target.created_at) {
            return Err(QueueError::NotFound(ticket_id));
        }

        self.complete_current(epoch, now).await?;

        let called = TicketRepository::update_state(target.id, TicketState::Called, now)
            .await
            .map_err(store_err)?;

        self.broadcast(QueueEvent::TicketRecalled {
            ticket_id: called.id,
            number: called.number,
            timestamp: now,
        });

        Ok(called)
    }

    /// Complete any currently called tickets, broadcasting each completion.
    async fn complete_current(
        &self,
        epoch: DayEpoch,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), QueueError> {
        let displaced = TicketRepository::complete_current(epoch, now)
            .await
            .map_err(store_err)?;

        for ticket in displaced {
            self.broadcast(QueueEvent::TicketCompleted {
                ticket_id: ticket.id,
                number: ticket.number,
                timestamp: now,
            });
        }

        Ok(())
    }
}

fn store_err(err: DbError) -> QueueError {
    QueueError::StoreUnavailable(err.to_string())
}

/// Queue actor that owns the day's queue transitions.
pub struct QueueActor;

impl Actor for QueueActor {
    type Msg = QueueMessage;
    type State = QueueActorState;
    type Arguments = QueueActorState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting ticket queue actor");
        Ok(args)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            QueueMessage::CreateTicket {
                national_id,
                first_name,
                last_name,
                reply,
            } => {
                let result = state.create_ticket(national_id, first_name, last_name).await;
                let _ = reply.send(result);
            }

            QueueMessage::CallNext { reply } => {
                let _ = reply.send(state.call_next().await);
            }

            QueueMessage::FinishCurrent { reply } => {
                let _ = reply.send(state.finish_current().await);
            }

            QueueMessage::Skip { reply } => {
                let _ = reply.send(state.skip().await);
            }

            QueueMessage::Recall { ticket_id, reply } => {
                let _ = reply.send(state.recall(ticket_id).await);
            }

            QueueMessage::Shutdown => {
                tracing::info!("Shutting down ticket queue actor");
                myself.stop(None);
            }
        }

        Ok(())
    }
}
