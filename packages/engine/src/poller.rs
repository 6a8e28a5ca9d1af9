//! Polling status watcher for display clients.
//!
//! A display client re-reads the queue on a fixed interval and plays a
//! one-shot cue when a new ticket is called. The poller centralizes
//! that: it publishes the latest snapshot over a watch channel and
//! flags `newly_called` exactly once when `current.id` changes from the
//! previously observed value. A failed read is logged and retried on
//! the next tick; staleness, not an error, is the failure mode here.

use std::time::Duration;

use ticket_core::{QueueStatus, TicketId};
use tokio::sync::watch;

use crate::engine::QueueEngine;

/// Refresh interval used by the reference display client.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// One observation of the queue, as seen by a display client.
#[derive(Debug, Clone, Default)]
pub struct StatusFrame {
    /// The snapshot read on this tick.
    pub status: QueueStatus,
    /// True on the first frame where `current` differs from the last
    /// observed called ticket; drives the client-side cue.
    pub newly_called: bool,
}

/// Spawn a poller that refreshes the queue status every `interval`.
///
/// The task stops when every receiver has been dropped.
pub fn spawn_status_poller(
    engine: QueueEngine,
    interval: Duration,
) -> (watch::Receiver<StatusFrame>, tokio::task::JoinHandle<()>) {
    let (tx, rx) = watch::channel(StatusFrame::default());

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        let mut last_called: Option<TicketId> = None;

        loop {
            ticker.tick().await;

            match engine.status().await {
                Ok(status) => {
                    let current_id = status.current.as_ref().map(|t| t.id);
                    let newly_called = current_id.is_some() && current_id != last_called;
                    if let Some(id) = current_id {
                        last_called = Some(id);
                    }

                    if tx
                        .send(StatusFrame {
                            status,
                            newly_called,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
                Err(err) => {
                    // Transient store faults surface as a stale display,
                    // not a hard error; retry on the next tick.
                    tracing::debug!("status poll failed, retrying next tick: {}", err);
                }
            }
        }
    });

    (rx, handle)
}
