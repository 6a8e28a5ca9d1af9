//! Database schema definitions using SurrealQL.

use crate::{DbError, get_db};

/// Initialize the database schema.
///
/// This creates all necessary tables, fields, and indexes.
pub async fn init_schema() -> Result<(), DbError> {
    let db = get_db()?;

    tracing::info!("Initializing database schema...");

    db.query(TICKET_SCHEMA).await?;

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Ticket table schema.
///
/// The `ticket_day_number` unique index is the store-level backstop for
/// queue-number uniqueness: should a writer outside the engine process
/// race an allocation, the insert fails instead of producing duplicates.
const TICKET_SCHEMA: &str = r#"
-- Ticket table: one record per queue entry, kept for the day as audit log
DEFINE TABLE IF NOT EXISTS ticket SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS national_id ON ticket TYPE string;
DEFINE FIELD IF NOT EXISTS first_name ON ticket TYPE string;
DEFINE FIELD IF NOT EXISTS last_name ON ticket TYPE string;
DEFINE FIELD IF NOT EXISTS number ON ticket TYPE int;
DEFINE FIELD IF NOT EXISTS state ON ticket TYPE string DEFAULT "waiting";
DEFINE FIELD IF NOT EXISTS day ON ticket TYPE string;
DEFINE FIELD IF NOT EXISTS created_at ON ticket TYPE datetime;
DEFINE FIELD IF NOT EXISTS updated_at ON ticket TYPE datetime;

-- Indexes for efficient queue queries
DEFINE INDEX IF NOT EXISTS ticket_state ON ticket FIELDS state;
DEFINE INDEX IF NOT EXISTS ticket_national_id ON ticket FIELDS national_id;
DEFINE INDEX IF NOT EXISTS ticket_created ON ticket FIELDS created_at;

-- Queue numbers are unique per local calendar day
DEFINE INDEX IF NOT EXISTS ticket_day_number ON ticket FIELDS day, number UNIQUE;
"#;
