use cap_watch_store::{CounterStore, SqliteStore, StoreError, UsageField, UsageRecord, STORE_DB_FILENAME};
use tempfile::tempdir;

fn full_record() -> UsageRecord {
    UsageRecord {
        cap_limit: Some(25),
        time_frame_hours: Some(3.0),
        message_count: Some(4),
        cap_start_time: Some(1_700_000_000_000),
    }
}

#[tokio::test]
async fn test_empty_store_returns_no_fields() {
    let store = SqliteStore::open_in_memory().expect("in-memory store should open");

    let record = store.get(&UsageField::ALL).await.expect("get should succeed");
    assert!(record.is_empty());
}

#[tokio::test]
async fn test_values_survive_reopen() {
    let temp = tempdir().expect("failed to create temp dir");

    {
        let store = SqliteStore::open(temp.path()).expect("store should open");
        store.set(full_record()).await.expect("set should succeed");
        assert_eq!(store.path(), Some(temp.path().join(STORE_DB_FILENAME).as_path()));
    }

    let reopened = SqliteStore::open(temp.path()).expect("store should reopen");
    let record = reopened
        .get(&UsageField::ALL)
        .await
        .expect("get should succeed");
    assert_eq!(record, full_record());
}

#[tokio::test]
async fn test_partial_set_keeps_other_fields() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.set(full_record()).await.unwrap();

    store
        .set(UsageRecord {
            cap_limit: Some(40),
            ..UsageRecord::default()
        })
        .await
        .unwrap();

    let record = store.get(&UsageField::ALL).await.unwrap();
    assert_eq!(record.cap_limit, Some(40));
    assert_eq!(record.message_count, Some(4));
    assert_eq!(record.cap_start_time, Some(1_700_000_000_000));
}

#[tokio::test]
async fn test_get_honours_requested_fields() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.set(full_record()).await.unwrap();

    let record = store
        .get(&[UsageField::MessageCount, UsageField::CapLimit])
        .await
        .unwrap();
    assert_eq!(record.message_count, Some(4));
    assert_eq!(record.cap_limit, Some(25));
    assert_eq!(record.time_frame_hours, None);
    assert_eq!(record.cap_start_time, None);
}

#[tokio::test]
async fn test_fractional_time_frame_is_preserved() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
        .set(UsageRecord {
            time_frame_hours: Some(0.5),
            ..UsageRecord::default()
        })
        .await
        .unwrap();

    let record = store.get(&[UsageField::TimeFrame]).await.unwrap();
    assert_eq!(record.time_frame_hours, Some(0.5));
}

#[tokio::test]
async fn test_corrupt_row_is_reported() {
    let temp = tempdir().unwrap();
    {
        let store = SqliteStore::open(temp.path()).unwrap();
        store.set(full_record()).await.unwrap();
    }

    let conn = rusqlite::Connection::open(temp.path().join(STORE_DB_FILENAME)).unwrap();
    conn.execute(
        "UPDATE usage_fields SET value = '\"many\"' WHERE key = 'messageCount'",
        [],
    )
    .unwrap();
    drop(conn);

    let store = SqliteStore::open(temp.path()).unwrap();
    let err = store.get(&UsageField::ALL).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Corrupt {
            field: UsageField::MessageCount,
            ..
        }
    ));
}

// A second store on the same file keeps writing count and start time together;
// the reader must always see a matching pair.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reader_never_sees_half_a_reset() {
    let temp = tempdir().unwrap();
    let writer = SqliteStore::open(temp.path()).unwrap();
    let reader = SqliteStore::open(temp.path()).unwrap();
    writer
        .set(UsageRecord {
            message_count: Some(0),
            cap_start_time: Some(0),
            ..UsageRecord::default()
        })
        .await
        .unwrap();

    let writes = tokio::spawn(async move {
        for n in 1..=500u64 {
            writer
                .set(UsageRecord {
                    message_count: Some(n),
                    cap_start_time: Some(n as i64),
                    ..UsageRecord::default()
                })
                .await
                .unwrap();
        }
    });

    let mut reads = 0;
    while !writes.is_finished() || reads == 0 {
        let record = reader
            .get(&[UsageField::MessageCount, UsageField::CapStartTime])
            .await
            .unwrap();
        let count = record.message_count.unwrap();
        let start = record.cap_start_time.unwrap();
        assert_eq!(count as i64, start, "read {count} with start {start}");
        reads += 1;
    }
    writes.await.unwrap();

    let record = reader.get(&UsageField::ALL).await.unwrap();
    assert_eq!(record.message_count, Some(500));
    assert_eq!(record.cap_start_time, Some(500));
}
