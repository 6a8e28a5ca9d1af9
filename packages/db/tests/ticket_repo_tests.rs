#![allow(clippy::disallowed_methods)]

mod common;

use std::error::Error;

use chrono::Utc;
use ticket_core::{DayEpoch, NationalId, Ticket, TicketState};

use db::{DbError, repositories::TicketRepository};

fn national_id(n: u64) -> NationalId {
    NationalId::parse(&format!("{:011}", 10_000_000_000u64 + n)).expect("valid national id")
}

fn ticket(n: u64, first: &str, last: &str, number: u32, epoch: DayEpoch) -> Ticket {
    Ticket::new(national_id(n), first, last, number, epoch.day, Utc::now())
}

#[tokio::test]
async fn test_ticket_repository() -> Result<(), Box<dyn Error>> {
    let _guard = common::setup_db().await?;
    let epoch = DayEpoch::containing(Utc::now());

    // create/get round trip
    let ada = ticket(1, "Ada", "Lovelace", 1, epoch);
    let created = TicketRepository::create(&ada).await?;
    assert_eq!(created.id, ada.id);
    assert_eq!(created.national_id, ada.national_id);
    assert_eq!(created.number, 1);
    assert_eq!(created.state, TicketState::Waiting);
    assert_eq!(created.day, epoch.day);

    let loaded = TicketRepository::get(ada.id).await?;
    assert_eq!(loaded, created);

    // duplicate (day, number) insert is rejected by the unique index
    let clash = ticket(2, "Grace", "Hopper", 1, epoch);
    let conflict = TicketRepository::create(&clash).await;
    assert!(matches!(conflict, Err(DbError::Conflict(_))));

    // missing id
    let missing = TicketRepository::get(ticket_core::TicketId::new()).await;
    assert!(matches!(missing, Err(DbError::NotFound(_))));

    // active-by-identity lookup sees waiting and called, not completed
    common::reset_db().await?;
    let ada = ticket(1, "Ada", "Lovelace", 1, epoch);
    TicketRepository::create(&ada).await?;

    let found = TicketRepository::find_active_by_national_id(epoch, &ada.national_id).await?;
    assert_eq!(found.map(|t| t.id), Some(ada.id));

    TicketRepository::update_state(ada.id, TicketState::Called, Utc::now()).await?;
    let found = TicketRepository::find_active_by_national_id(epoch, &ada.national_id).await?;
    assert_eq!(found.map(|t| t.id), Some(ada.id));

    TicketRepository::update_state(ada.id, TicketState::Completed, Utc::now()).await?;
    let found = TicketRepository::find_active_by_national_id(epoch, &ada.national_id).await?;
    assert!(found.is_none());

    // ordering: waiting ascending, completed descending, first_waiting
    common::reset_db().await?;
    for (n, number) in [(1u64, 3u32), (2, 1), (3, 2)] {
        TicketRepository::create(&ticket(n, "P", "Q", number, epoch)).await?;
    }

    let first = TicketRepository::first_waiting(epoch).await?;
    assert_eq!(first.map(|t| t.number), Some(1));

    let waiting = TicketRepository::list_waiting(epoch).await?;
    assert_eq!(
        waiting.iter().map(|t| t.number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let ids: Vec<_> = waiting.iter().map(|t| t.id).collect();
    TicketRepository::update_state(ids[0], TicketState::Completed, Utc::now()).await?;
    TicketRepository::update_state(ids[1], TicketState::Completed, Utc::now()).await?;

    let completed = TicketRepository::list_completed(epoch).await?;
    assert_eq!(
        completed.iter().map(|t| t.number).collect::<Vec<_>>(),
        vec![2, 1]
    );

    // max_number spans all states; count_waiting_before ignores them
    let max = TicketRepository::max_number(epoch).await?;
    assert_eq!(max, 3);

    let before = TicketRepository::count_waiting_before(epoch, 10).await?;
    assert_eq!(before, 1); // only number 3 still waits

    common::reset_db().await?;
    let max = TicketRepository::max_number(epoch).await?;
    assert_eq!(max, 0);

    // reassign moves a ticket back to waiting under a new number
    let ada = ticket(1, "Ada", "Lovelace", 1, epoch);
    TicketRepository::create(&ada).await?;
    TicketRepository::update_state(ada.id, TicketState::Called, Utc::now()).await?;

    let moved = TicketRepository::reassign(ada.id, 5, Utc::now()).await?;
    assert_eq!(moved.state, TicketState::Waiting);
    assert_eq!(moved.number, 5);
    assert_eq!(moved.id, ada.id);

    // complete_current completes every called ticket and returns them
    common::reset_db().await?;
    let ada = ticket(1, "Ada", "Lovelace", 1, epoch);
    let grace = ticket(2, "Grace", "Hopper", 2, epoch);
    TicketRepository::create(&ada).await?;
    TicketRepository::create(&grace).await?;
    TicketRepository::update_state(ada.id, TicketState::Called, Utc::now()).await?;

    let displaced = TicketRepository::complete_current(epoch, Utc::now()).await?;
    assert_eq!(displaced.len(), 1);
    assert_eq!(displaced[0].id, ada.id);
    assert_eq!(displaced[0].state, TicketState::Completed);

    let none_displaced = TicketRepository::complete_current(epoch, Utc::now()).await?;
    assert!(none_displaced.is_empty());

    // status snapshot partitions by state with the right orderings
    TicketRepository::update_state(grace.id, TicketState::Called, Utc::now()).await?;
    TicketRepository::create(&ticket(3, "Edsger", "Dijkstra", 3, epoch)).await?;

    let status = TicketRepository::status(epoch).await?;
    assert_eq!(status.current.as_ref().map(|t| t.id), Some(grace.id));
    assert_eq!(status.waiting.len(), 1);
    assert_eq!(status.waiting[0].number, 3);
    assert_eq!(status.completed.len(), 1);
    assert_eq!(status.completed[0].id, ada.id);

    // prior-day tickets are invisible to epoch-scoped queries
    common::reset_db().await?;
    let mut stale = ticket(4, "Old", "Entry", 1, epoch);
    stale.created_at = epoch.start - chrono::Duration::hours(2);
    stale.updated_at = stale.created_at;
    stale.day = epoch.day.pred_opt().expect("previous day");
    TicketRepository::create(&stale).await?;

    assert!(TicketRepository::first_waiting(epoch).await?.is_none());
    assert_eq!(TicketRepository::max_number(epoch).await?, 0);
    let status = TicketRepository::status(epoch).await?;
    assert_eq!(status.total(), 0);

    Ok(())
}
