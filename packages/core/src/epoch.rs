//! Day-epoch scoping and the injectable time source.

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Source of "now" for the engine.
///
/// The engine never reads ambient wall-clock time directly; callers
/// inject a clock so epoch boundaries are deterministic under test.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time source used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The local calendar day containing a given instant.
///
/// All queue queries and invariants are scoped to one epoch; tickets
/// from prior epochs are invisible to the engine. Recomputed per call,
/// never cached, so the queue rolls over at local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayEpoch {
    /// The local calendar day.
    pub day: NaiveDate,
    /// UTC instant of local midnight starting this day.
    pub start: DateTime<Utc>,
}

impl DayEpoch {
    /// Compute the epoch containing `now`.
    pub fn containing(now: DateTime<Utc>) -> Self {
        let day = now.with_timezone(&Local).date_naive();
        let start = day
            .and_hms_opt(0, 0, 0)
            .and_then(|t| t.and_local_timezone(Local).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            // Midnight can be skipped by a DST jump in rare zones.
            .unwrap_or(now);
        Self { day, start }
    }

    /// Whether an instant falls inside this epoch's scope.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start
    }
}
