//! Ticket repository: the store interface consumed by the queue engine.
//!
//! Every method is a single store call (one SurrealDB query), so each is
//! atomic on its own. Cross-call atomicity for multi-step transitions is
//! the engine's responsibility.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::{Datetime, Thing};
use ticket_core::{DayEpoch, NationalId, QueueStatus, Ticket, TicketId, TicketState};

use crate::{DbError, get_db};

/// Repository for ticket persistence operations.
pub struct TicketRepository;

/// Internal record type for SurrealDB.
#[derive(Debug, Serialize, Deserialize)]
struct TicketRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Thing>,
    national_id: NationalId,
    first_name: String,
    last_name: String,
    number: u32,
    state: TicketState,
    day: String,
    created_at: Datetime,
    updated_at: Datetime,
}

impl TicketRecord {
    fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            id: None,
            national_id: ticket.national_id.clone(),
            first_name: ticket.first_name.clone(),
            last_name: ticket.last_name.clone(),
            number: ticket.number,
            state: ticket.state,
            day: ticket.day.to_string(),
            created_at: Datetime::from(ticket.created_at),
            updated_at: Datetime::from(ticket.updated_at),
        }
    }

    fn into_ticket(self) -> Result<Ticket, DbError> {
        let raw = self.id.as_ref().map(|t| t.id.to_raw()).unwrap_or_default();
        let id = TicketId::parse(&raw)
            .map_err(|_| DbError::Query(format!("invalid ticket record id: {raw}")))?;
        let day: NaiveDate = self
            .day
            .parse()
            .map_err(|_| DbError::Query(format!("invalid ticket day: {}", self.day)))?;
        Ok(Ticket {
            id,
            national_id: self.national_id,
            first_name: self.first_name,
            last_name: self.last_name,
            number: self.number,
            state: self.state,
            day,
            created_at: DateTime::<Utc>::from(self.created_at),
            updated_at: DateTime::<Utc>::from(self.updated_at),
        })
    }
}

fn into_tickets(records: Vec<TicketRecord>) -> Result<Vec<Ticket>, DbError> {
    records.into_iter().map(TicketRecord::into_ticket).collect()
}

impl TicketRepository {
    /// Create a new ticket in the database.
    ///
    /// Fails with `DbError::Conflict` if the `(day, number)` unique index
    /// rejects the insert.
    pub async fn create(ticket: &Ticket) -> Result<Ticket, DbError> {
        let db = get_db()?;

        let record: Option<TicketRecord> = db
            .create(("ticket", ticket.id.to_string()))
            .content(TicketRecord::from_ticket(ticket))
            .await?;

        record
            .ok_or_else(|| DbError::Query("Failed to create ticket".into()))?
            .into_ticket()
    }

    /// Get a ticket by ID, regardless of day.
    pub async fn get(id: TicketId) -> Result<Ticket, DbError> {
        let db = get_db()?;

        let record: Option<TicketRecord> = db.select(("ticket", id.to_string())).await?;

        record
            .ok_or_else(|| DbError::NotFound(format!("Ticket not found: {}", id)))?
            .into_ticket()
    }

    /// Find the currently called ticket for the epoch, if any.
    pub async fn find_current(epoch: DayEpoch) -> Result<Option<Ticket>, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "SELECT * FROM ticket WHERE state = 'called' AND created_at >= $start \
                 ORDER BY number ASC LIMIT 1",
            )
            .bind(("start", Datetime::from(epoch.start)))
            .await?;

        let records: Vec<TicketRecord> = result.take(0)?;
        records.into_iter().next().map(TicketRecord::into_ticket).transpose()
    }

    /// Find an active (waiting or called) ticket for an identity in the epoch.
    pub async fn find_active_by_national_id(
        epoch: DayEpoch,
        national_id: &NationalId,
    ) -> Result<Option<Ticket>, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "SELECT * FROM ticket WHERE national_id = $national_id \
                 AND state IN ['waiting', 'called'] AND created_at >= $start LIMIT 1",
            )
            .bind(("national_id", national_id.as_str().to_string()))
            .bind(("start", Datetime::from(epoch.start)))
            .await?;

        let records: Vec<TicketRecord> = result.take(0)?;
        records.into_iter().next().map(TicketRecord::into_ticket).transpose()
    }

    /// The waiting ticket with the smallest number, if any.
    pub async fn first_waiting(epoch: DayEpoch) -> Result<Option<Ticket>, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "SELECT * FROM ticket WHERE state = 'waiting' AND created_at >= $start \
                 ORDER BY number ASC LIMIT 1",
            )
            .bind(("start", Datetime::from(epoch.start)))
            .await?;

        let records: Vec<TicketRecord> = result.take(0)?;
        records.into_iter().next().map(TicketRecord::into_ticket).transpose()
    }

    /// All waiting tickets for the epoch, ascending by number.
    pub async fn list_waiting(epoch: DayEpoch) -> Result<Vec<Ticket>, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "SELECT * FROM ticket WHERE state = 'waiting' AND created_at >= $start \
                 ORDER BY number ASC",
            )
            .bind(("start", Datetime::from(epoch.start)))
            .await?;

        let records: Vec<TicketRecord> = result.take(0)?;
        into_tickets(records)
    }

    /// All completed tickets for the epoch, most recent number first.
    pub async fn list_completed(epoch: DayEpoch) -> Result<Vec<Ticket>, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "SELECT * FROM ticket WHERE state = 'completed' AND created_at >= $start \
                 ORDER BY number DESC",
            )
            .bind(("start", Datetime::from(epoch.start)))
            .await?;

        let records: Vec<TicketRecord> = result.take(0)?;
        into_tickets(records)
    }

    /// Highest queue number assigned in the epoch, across all states.
    ///
    /// Spans completed tickets too, so numbers never regress after a
    /// finish. Returns 0 for an empty day.
    pub async fn max_number(epoch: DayEpoch) -> Result<u32, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "SELECT math::max(number) AS max FROM ticket \
                 WHERE created_at >= $start GROUP ALL",
            )
            .bind(("start", Datetime::from(epoch.start)))
            .await?;

        #[derive(Deserialize)]
        struct MaxResult {
            max: Option<u32>,
        }

        let rows: Vec<MaxResult> = result.take(0)?;
        Ok(rows.into_iter().next().and_then(|r| r.max).unwrap_or(0))
    }

    /// Count waiting tickets with a number smaller than the given one.
    pub async fn count_waiting_before(epoch: DayEpoch, number: u32) -> Result<u32, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "SELECT count() AS count FROM ticket WHERE state = 'waiting' \
                 AND created_at >= $start AND number < $number GROUP ALL",
            )
            .bind(("start", Datetime::from(epoch.start)))
            .bind(("number", number))
            .await?;

        #[derive(Deserialize)]
        struct CountResult {
            count: i64,
        }

        let rows: Vec<CountResult> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.count as u32).unwrap_or(0))
    }

    /// Update a ticket's state.
    pub async fn update_state(
        id: TicketId,
        state: TicketState,
        now: DateTime<Utc>,
    ) -> Result<Ticket, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "UPDATE type::thing('ticket', $id) SET state = $state, \
                 updated_at = $now RETURN AFTER",
            )
            .bind(("id", id.to_string()))
            .bind(("state", state))
            .bind(("now", Datetime::from(now)))
            .await?;

        let records: Vec<TicketRecord> = result.take(0)?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound(format!("Ticket not found: {}", id)))?
            .into_ticket()
    }

    /// Move a ticket back to waiting under a freshly allocated number.
    ///
    /// Fails with `DbError::Conflict` if the number was taken meanwhile.
    pub async fn reassign(
        id: TicketId,
        number: u32,
        now: DateTime<Utc>,
    ) -> Result<Ticket, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "UPDATE type::thing('ticket', $id) SET state = 'waiting', \
                 number = $number, updated_at = $now RETURN AFTER",
            )
            .bind(("id", id.to_string()))
            .bind(("number", number))
            .bind(("now", Datetime::from(now)))
            .await?;

        let records: Vec<TicketRecord> = result.take(0)?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound(format!("Ticket not found: {}", id)))?
            .into_ticket()
    }

    /// Complete every called ticket in the epoch (at most one when the
    /// engine's invariants hold). Returns the tickets that were completed.
    pub async fn complete_current(
        epoch: DayEpoch,
        now: DateTime<Utc>,
    ) -> Result<Vec<Ticket>, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "UPDATE ticket SET state = 'completed', updated_at = $now \
                 WHERE state = 'called' AND created_at >= $start RETURN AFTER",
            )
            .bind(("start", Datetime::from(epoch.start)))
            .bind(("now", Datetime::from(now)))
            .await?;

        let records: Vec<TicketRecord> = result.take(0)?;
        into_tickets(records)
    }

    /// Read the whole queue snapshot for the epoch in one store call.
    ///
    /// The three statements run inside a single SurrealDB transaction, so
    /// readers never observe a half-applied transition (a ticket missing
    /// from both `current` and `waiting`).
    pub async fn status(epoch: DayEpoch) -> Result<QueueStatus, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "SELECT * FROM ticket WHERE state = 'called' AND created_at >= $start \
                 ORDER BY number ASC LIMIT 1;\
                 SELECT * FROM ticket WHERE state = 'waiting' AND created_at >= $start \
                 ORDER BY number ASC;\
                 SELECT * FROM ticket WHERE state = 'completed' AND created_at >= $start \
                 ORDER BY number DESC;",
            )
            .bind(("start", Datetime::from(epoch.start)))
            .await?;

        let called: Vec<TicketRecord> = result.take(0)?;
        let waiting: Vec<TicketRecord> = result.take(1)?;
        let completed: Vec<TicketRecord> = result.take(2)?;

        Ok(QueueStatus {
            current: called
                .into_iter()
                .next()
                .map(TicketRecord::into_ticket)
                .transpose()?,
            waiting: into_tickets(waiting)?,
            completed: into_tickets(completed)?,
        })
    }
}
