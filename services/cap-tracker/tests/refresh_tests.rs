use std::sync::Arc;
use std::time::Duration;

use cap_watch_store::MemoryStore;
use cap_watch_tracker::{
    start_refresh_task, BoardEntry, ManualClock, Severity, StatusBoard, TrackerError,
    UsageWindowTracker,
};
use tokio::sync::Notify;
use tokio::time::{sleep, timeout};

const START: i64 = 1_700_000_000_000;

async fn wait_for<F>(board: &StatusBoard, predicate: F) -> BoardEntry
where
    F: Fn(&BoardEntry) -> bool,
{
    timeout(Duration::from_secs(5), async {
        loop {
            if let Some(entry) = board.current().await {
                if predicate(&entry) {
                    return entry;
                }
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("board should reach expected state")
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_badge() {
    let store = MemoryStore::new();
    let tracker = UsageWindowTracker::new(Arc::new(store.clone()))
        .with_clock(Arc::new(ManualClock::new(START)));
    tracker.initialize().await.unwrap();
    tracker.record_event().await.unwrap();

    let board = StatusBoard::new();
    let first = board.refresh(&tracker).await.unwrap();
    assert_eq!(first.status.remaining, 24);

    store.set_unavailable(true);
    let err = board.refresh(&tracker).await.unwrap_err();
    assert!(matches!(err, TrackerError::Store(_)));

    let current = board.current().await.expect("previous entry should remain");
    assert_eq!(current, first);
}

#[tokio::test]
async fn test_refresh_task_follows_change_notifications() {
    let store = MemoryStore::new();
    let changes = Arc::new(Notify::new());
    let tracker = UsageWindowTracker::new(Arc::new(store))
        .with_clock(Arc::new(ManualClock::new(START)))
        .with_notifier({
            let changes = Arc::clone(&changes);
            move || changes.notify_one()
        });
    tracker.initialize().await.unwrap();

    let board = StatusBoard::new();
    let task = start_refresh_task(
        tracker.clone(),
        board.clone(),
        Duration::from_secs(3600),
        Arc::clone(&changes),
    );

    wait_for(&board, |entry| entry.status.remaining == 25).await;

    for _ in 0..16 {
        tracker.record_event().await.unwrap();
    }

    let entry = wait_for(&board, |entry| entry.status.remaining == 9).await;
    assert_eq!(entry.status.severity, Severity::Medium);
    assert_eq!(entry.badge.background_color, "#FF9800");

    task.abort();
}
