//! Integration tests for accepting and declining confirmations.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use confpoll::adapters::mock::MockProvider;
use confpoll::events::{ActionResult, ConfirmationAction, EngineState};
use confpoll::models::ConfirmationStatus;
use tokio_util::sync::CancellationToken;

async fn fetched_engine(
    provider: &Arc<MockProvider>,
    count: u64,
) -> (confpoll::PollingEngine, Arc<confpoll::adapters::mock::InMemoryHistory>) {
    provider.set_default_list(confirmations(count));
    let (engine, history) = build_engine(provider);
    assert!(engine.fetch_once().await);
    (engine, history)
}

#[tokio::test]
async fn test_accept_all_waiting() {
    let provider = Arc::new(MockProvider::new());
    let (engine, history) = fetched_engine(&provider, 3).await;
    let mut rx = engine.subscribe();

    let ok = engine
        .process_waiting(ConfirmationAction::Accept, &CancellationToken::new())
        .await;

    assert!(ok);
    assert!(engine
        .store()
        .snapshot()
        .iter()
        .all(|item| item.status() == ConfirmationStatus::Accepted));
    assert_eq!(history.len(), 3);
    assert_eq!(
        history.lines()[0],
        "Confirmation ID:1 Key:31 Creator:7 Type:Trade Accept: Success"
    );

    let events = drain_events(&mut rx);
    assert_eq!(batches(&events), vec![(ActionResult::Accept, 3)]);
    assert_eq!(
        item_results(&events),
        vec![
            (ActionResult::Accept, 1),
            (ActionResult::Accept, 2),
            (ActionResult::Accept, 3)
        ]
    );
    assert_eq!(
        states(&events),
        vec![
            EngineState::ConfirmationProcessing,
            EngineState::ConfirmationProcessed
        ]
    );
}

#[tokio::test]
async fn test_items_processed_in_given_order() {
    let provider = Arc::new(MockProvider::new());
    let (engine, _) = fetched_engine(&provider, 3).await;

    let mut items = engine.store().snapshot();
    items.reverse();
    engine
        .process_many(&items, ConfirmationAction::Decline, &CancellationToken::new())
        .await;

    let ids: Vec<u64> = provider.actions().iter().map(|a| a.confirmation_id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert!(provider
        .actions()
        .iter()
        .all(|a| a.action == ConfirmationAction::Decline));
}

#[tokio::test]
async fn test_failed_decline_marks_unknown() {
    let provider = Arc::new(MockProvider::new());
    provider.set_deny_result(false);
    let (engine, history) = fetched_engine(&provider, 2).await;
    let mut rx = engine.subscribe();

    let ok = engine
        .process_waiting(ConfirmationAction::Decline, &CancellationToken::new())
        .await;

    assert!(!ok);
    assert!(engine
        .store()
        .snapshot()
        .iter()
        .all(|item| item.status() == ConfirmationStatus::Unknown));
    assert!(history.lines()[1].ends_with("Decline: Failed"));

    let events = drain_events(&mut rx);
    assert_eq!(batches(&events), vec![(ActionResult::Decline, 0)]);
    assert_eq!(
        item_results(&events),
        vec![(ActionResult::Error, 1), (ActionResult::Error, 2)]
    );
}

#[tokio::test]
async fn test_processed_item_is_not_dispatched_again() {
    let provider = Arc::new(MockProvider::new());
    let (engine, _) = fetched_engine(&provider, 1).await;
    let item = engine.store().snapshot().remove(0);

    assert!(engine.process_one(&item, ConfirmationAction::Accept).await);
    assert!(!engine.process_one(&item, ConfirmationAction::Decline).await);

    assert_eq!(provider.actions().len(), 1);
    assert_eq!(item.status(), ConfirmationStatus::Accepted);
}

#[tokio::test]
async fn test_process_uses_current_session() {
    let provider = Arc::new(MockProvider::new());
    let (engine, _) = fetched_engine(&provider, 1).await;
    assert!(engine.session_guard().refresh_session().await);

    engine
        .process_waiting(ConfirmationAction::Accept, &CancellationToken::new())
        .await;
    assert_eq!(provider.actions()[0].access_token, "refreshed-1");
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_batch_finishes_in_flight_item() {
    let provider = Arc::new(MockProvider::new());
    provider.set_action_delay(Some(Duration::from_secs(1)));
    let (engine, _) = fetched_engine(&provider, 3).await;
    let engine = Arc::new(engine);
    let items = engine.store().snapshot();
    let cancel = CancellationToken::new();
    let mut rx = engine.subscribe();

    let batch = {
        let engine = Arc::clone(&engine);
        let items = items.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            engine
                .process_many(&items, ConfirmationAction::Accept, &cancel)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(engine.is_processing());
    cancel.cancel();

    assert!(!batch.await.unwrap());
    assert_eq!(items[0].status(), ConfirmationStatus::Accepted);
    assert_eq!(items[1].status(), ConfirmationStatus::Waiting);
    assert_eq!(items[2].status(), ConfirmationStatus::Waiting);
    assert_eq!(provider.actions().len(), 1);
    assert!(!engine.is_processing());
    assert_eq!(
        batches(&drain_events(&mut rx)),
        vec![(ActionResult::Accept, 1)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_batches_do_not_interleave() {
    let provider = Arc::new(MockProvider::new());
    provider.set_action_delay(Some(Duration::from_millis(100)));
    let (engine, _) = fetched_engine(&provider, 4).await;
    let engine = Arc::new(engine);
    let items = engine.store().snapshot();

    let spawn_batch = |batch: Vec<_>| {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .process_many(&batch, ConfirmationAction::Accept, &CancellationToken::new())
                .await
        })
    };
    let first = spawn_batch(vec![items[0].clone(), items[2].clone()]);
    let second = spawn_batch(vec![items[1].clone(), items[3].clone()]);

    assert!(first.await.unwrap());
    assert!(second.await.unwrap());

    let ids: Vec<u64> = provider.actions().iter().map(|a| a.confirmation_id).collect();
    assert!(ids == vec![1, 3, 2, 4] || ids == vec![2, 4, 1, 3], "interleaved: {:?}", ids);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_runs_while_batch_drains() {
    let provider = Arc::new(MockProvider::new());
    provider.set_action_delay(Some(Duration::from_secs(5)));
    let (engine, _) = fetched_engine(&provider, 1).await;
    let engine = Arc::new(engine);

    let batch = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .process_waiting(ConfirmationAction::Accept, &CancellationToken::new())
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = tokio::time::Instant::now();
    assert!(engine.fetch_once().await);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(batch.await.unwrap());
}

#[tokio::test]
async fn test_empty_batch_reports_zero() {
    let provider = Arc::new(MockProvider::new());
    let (engine, _) = build_engine(&provider);
    let mut rx = engine.subscribe();

    assert!(
        engine
            .process_many(&[], ConfirmationAction::Accept, &CancellationToken::new())
            .await
    );
    assert_eq!(
        batches(&drain_events(&mut rx)),
        vec![(ActionResult::Accept, 0)]
    );
}
