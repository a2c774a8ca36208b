use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;
use crate::record::{UsageField, UsageRecord};
use crate::CounterStore;

/// Process-local store. Clones share one namespace.
#[derive(Clone, Default)]
pub struct MemoryStore {
    fields: Arc<Mutex<HashMap<UsageField, Value>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: UsageRecord) -> Self {
        let store = Self::default();
        if let Ok(mut fields) = store.fields.lock() {
            fields.extend(record.entries());
        }
        store
    }

    /// While set, every `get`/`set` fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Writes a raw value, bypassing field encoding.
    pub fn put_raw(&self, field: UsageField, value: Value) -> Result<(), StoreError> {
        let mut fields = self.lock()?;
        fields.insert(field, value);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<UsageField, Value>>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".into()));
        }
        self.fields
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn get(&self, fields: &[UsageField]) -> Result<UsageRecord, StoreError> {
        let stored = self.lock()?;
        let mut record = UsageRecord::default();
        for field in fields {
            if let Some(value) = stored.get(field) {
                record.insert(*field, value)?;
            }
        }
        Ok(record)
    }

    async fn set(&self, values: UsageRecord) -> Result<(), StoreError> {
        let entries = values.entries();
        let mut stored = self.lock()?;
        debug!(fields = entries.len(), "writing usage fields to memory store");
        stored.extend(entries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn get_returns_only_present_fields() {
        let store = MemoryStore::new();
        store
            .set(UsageRecord {
                cap_limit: Some(25),
                ..UsageRecord::default()
            })
            .await
            .unwrap();

        let record = store.get(&UsageField::ALL).await.unwrap();
        assert_eq!(record.cap_limit, Some(25));
        assert_eq!(record.message_count, None);
        assert_eq!(record.fields(), vec![UsageField::CapLimit]);
    }

    #[tokio::test]
    async fn clones_share_namespace() {
        let first = MemoryStore::new();
        let second = first.clone();

        first
            .set(UsageRecord {
                message_count: Some(3),
                ..UsageRecord::default()
            })
            .await
            .unwrap();

        let record = second.get(&[UsageField::MessageCount]).await.unwrap();
        assert_eq!(record.message_count, Some(3));
    }

    #[tokio::test]
    async fn set_overwrites_per_field() {
        let store = MemoryStore::with_record(UsageRecord {
            cap_limit: Some(25),
            time_frame_hours: Some(3.0),
            message_count: Some(9),
            cap_start_time: Some(1_000),
        });

        store
            .set(UsageRecord {
                message_count: Some(0),
                cap_start_time: Some(2_000),
                ..UsageRecord::default()
            })
            .await
            .unwrap();

        let record = store.get(&UsageField::ALL).await.unwrap();
        assert_eq!(record.cap_limit, Some(25));
        assert_eq!(record.time_frame_hours, Some(3.0));
        assert_eq!(record.message_count, Some(0));
        assert_eq!(record.cap_start_time, Some(2_000));
    }

    #[tokio::test]
    async fn unavailable_store_fails_reads_and_writes() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        assert!(matches!(
            store.get(&UsageField::ALL).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.set(UsageRecord::default()).await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_unavailable(false);
        assert!(store.get(&UsageField::ALL).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_value_surfaces_error() {
        let store = MemoryStore::new();
        store
            .put_raw(UsageField::CapLimit, json!("twenty-five"))
            .unwrap();

        let err = store.get(&[UsageField::CapLimit]).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Corrupt {
                field: UsageField::CapLimit,
                ..
            }
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reader_never_sees_half_a_reset() {
        let store = MemoryStore::with_record(UsageRecord {
            message_count: Some(0),
            cap_start_time: Some(0),
            ..UsageRecord::default()
        });

        let writer = store.clone();
        let writes = tokio::spawn(async move {
            for n in 1..=2_000u64 {
                writer
                    .set(UsageRecord {
                        message_count: Some(n),
                        cap_start_time: Some(n as i64),
                        ..UsageRecord::default()
                    })
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        });

        while !writes.is_finished() {
            let record = store
                .get(&[UsageField::MessageCount, UsageField::CapStartTime])
                .await
                .unwrap();
            assert_eq!(
                record.message_count.map(|count| count as i64),
                record.cap_start_time
            );
            tokio::task::yield_now().await;
        }
        writes.await.unwrap();
    }
}
