#![allow(clippy::disallowed_methods)]

mod common;

use std::error::Error;
use std::sync::Arc;

use chrono::Utc;
use db::repositories::TicketRepository;
use engine::start_engine;
use ticket_core::{
    DayEpoch, NationalId, QueueError, QueueEvent, SystemClock, Ticket, TicketId, TicketState,
};

fn nid(n: u64) -> String {
    format!("{:011}", 10_000_000_000u64 + n)
}

#[tokio::test]
async fn test_queue_engine() -> Result<(), Box<dyn Error>> {
    let _guard = common::setup_db().await?;
    let (engine, _handle) = start_engine(Arc::new(SystemClock)).await?;

    // Validation fails before any store access
    assert!(matches!(
        engine.create_ticket("123", "Ada", "Lovelace").await,
        Err(QueueError::Validation(_))
    ));
    assert!(matches!(
        engine.create_ticket(&nid(1), "  ", "Lovelace").await,
        Err(QueueError::Validation(_))
    ));
    assert!(matches!(
        engine.create_ticket(&nid(1), "Ada", "").await,
        Err(QueueError::Validation(_))
    ));

    // The reference scenario: A,B -> numbers 1,2; call twice; finish; recall A
    let mut events = engine.subscribe();

    let a = engine.create_ticket(&nid(1), "Ada", "Lovelace").await?;
    assert_eq!(a.ticket.number, 1);
    assert_eq!(a.position, 1);
    assert_eq!(a.ticket.state, TicketState::Waiting);
    assert!(matches!(
        events.recv().await,
        Ok(QueueEvent::TicketCreated { .. })
    ));

    let b = engine.create_ticket(&nid(2), "Grace", "Hopper").await?;
    assert_eq!(b.ticket.number, 2);
    assert_eq!(b.position, 2);

    // A duplicate active identity is rejected and mutates nothing
    let dup = engine.create_ticket(&nid(1), "Ada", "Lovelace").await;
    assert_eq!(dup, Err(QueueError::DuplicateActiveEntry));
    let status = engine.status().await?;
    assert!(status.current.is_none());
    assert_eq!(status.waiting.len(), 2);

    let called = engine.call_next().await?;
    assert_eq!(called.id, a.ticket.id);
    assert_eq!(called.state, TicketState::Called);
    assert!(matches!(
        events.recv().await,
        Ok(QueueEvent::TicketCreated { .. })
    ));
    assert!(matches!(
        events.recv().await,
        Ok(QueueEvent::TicketCalled { .. })
    ));

    // Calling next implicitly completes the current ticket
    let called = engine.call_next().await?;
    assert_eq!(called.id, b.ticket.id);
    let status = engine.status().await?;
    assert_eq!(status.current.as_ref().map(|t| t.id), Some(b.ticket.id));
    assert!(status.waiting.is_empty());
    assert_eq!(
        status.completed.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![a.ticket.id]
    );

    let finished = engine.finish_current().await?;
    assert_eq!(finished.id, b.ticket.id);
    let status = engine.status().await?;
    assert!(status.current.is_none());
    assert!(status.waiting.is_empty());
    assert_eq!(
        status.completed.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![b.ticket.id, a.ticket.id]
    );

    let recalled = engine.recall(a.ticket.id).await?;
    assert_eq!(recalled.id, a.ticket.id);
    assert_eq!(recalled.state, TicketState::Called);
    let status = engine.status().await?;
    assert_eq!(status.current.map(|t| t.id), Some(a.ticket.id));
    assert_eq!(
        status.completed.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![b.ticket.id]
    );

    // Empty waiting set: call_next fails and the desk stays as it was
    assert_eq!(engine.call_next().await, Err(QueueError::EmptyQueue));
    let status = engine.status().await?;
    assert_eq!(status.current.map(|t| t.id), Some(a.ticket.id));

    common::reset_db().await?;
    assert_eq!(engine.call_next().await, Err(QueueError::EmptyQueue));
    assert_eq!(
        engine.finish_current().await,
        Err(QueueError::NoCurrentPatient)
    );
    assert_eq!(engine.skip().await, Err(QueueError::NoCurrentPatient));

    // Skip moves the current ticket to the back under a fresh number
    let a = engine.create_ticket(&nid(1), "Ada", "Lovelace").await?;
    let b = engine.create_ticket(&nid(2), "Grace", "Hopper").await?;
    engine.call_next().await?;

    let skipped = engine.skip().await?;
    assert_eq!(skipped.id, a.ticket.id);
    assert_eq!(skipped.state, TicketState::Waiting);
    assert!(skipped.number > b.ticket.number);
    let status = engine.status().await?;
    assert!(status.current.is_none());
    assert_eq!(
        status.waiting.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![b.ticket.id, a.ticket.id]
    );

    // A skipped ticket is still active, so its identity stays blocked
    assert_eq!(
        engine.create_ticket(&nid(1), "Ada", "Lovelace").await,
        Err(QueueError::DuplicateActiveEntry)
    );

    let called = engine.call_next().await?;
    assert_eq!(called.id, b.ticket.id);

    // Recall: unknown ids and prior-day tickets are NotFound
    assert!(matches!(
        engine.recall(TicketId::new()).await,
        Err(QueueError::NotFound(_))
    ));

    let epoch = DayEpoch::containing(Utc::now());
    let stale = Ticket::new(
        NationalId::parse(&nid(9))?,
        "Old",
        "Entry",
        1,
        epoch.day.pred_opt().expect("previous day"),
        epoch.start - chrono::Duration::hours(2),
    );
    let stale = TicketRepository::create(&stale).await?;
    assert_eq!(
        engine.recall(stale.id).await,
        Err(QueueError::NotFound(stale.id))
    );

    // Recalling a waiting ticket forces it to the desk, displacing B
    let recalled = engine.recall(skipped.id).await?;
    assert_eq!(recalled.id, a.ticket.id);
    assert_eq!(recalled.state, TicketState::Called);
    let status = engine.status().await?;
    assert_eq!(status.current.map(|t| t.id), Some(a.ticket.id));
    assert!(status.completed.iter().any(|t| t.id == b.ticket.id));

    Ok(())
}
