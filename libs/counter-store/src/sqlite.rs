use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, TransactionBehavior};
use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;
use crate::record::{UsageField, UsageRecord};
use crate::schema::init_database;
use crate::{CounterStore, STORE_DB_FILENAME};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Durable store backed by a single SQLite file.
///
/// Several stores (in one process or many) may open the same file. Each
/// `get` reads one snapshot and each `set` commits one transaction, so a
/// reader never observes half of another store's write.
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join(STORE_DB_FILENAME);
        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        init_database(&conn)?;

        debug!(path = %db_path.display(), "opened sqlite usage store");
        Ok(Self {
            path: Some(db_path),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_database(&conn)?;
        Ok(Self {
            path: None,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Runs `work` against the connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("connection poisoned".into()))?;
            work(&mut conn)
        })
        .await
        .map_err(|err| StoreError::Unavailable(format!("store task failed: {err}")))?
    }
}

#[async_trait]
impl CounterStore for SqliteStore {
    async fn get(&self, fields: &[UsageField]) -> Result<UsageRecord, StoreError> {
        let fields = fields.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
            let rows = {
                let mut stmt = tx.prepare_cached(
                    r#"
                    SELECT key, value
                    FROM usage_fields
                    "#,
                )?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            };
            tx.commit()?;

            let mut record = UsageRecord::default();
            for (key, raw) in rows {
                let Ok(field) = key.parse::<UsageField>() else {
                    continue;
                };
                if !fields.contains(&field) {
                    continue;
                }
                let value: Value =
                    serde_json::from_str(&raw).map_err(|err| StoreError::corrupt(field, err))?;
                record.insert(field, &value)?;
            }
            Ok(record)
        })
        .await
    }

    async fn set(&self, values: UsageRecord) -> Result<(), StoreError> {
        let entries = values.entries();
        if entries.is_empty() {
            return Ok(());
        }

        let written = entries.len();
        self.with_conn(move |conn| {
            let now = Utc::now().to_rfc3339();
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            {
                let mut stmt = tx.prepare_cached(
                    r#"
                    INSERT INTO usage_fields (key, value, updated_at)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at
                    "#,
                )?;
                for (field, value) in &entries {
                    stmt.execute(params![field.key(), value.to_string(), now])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await?;

        debug!(fields = written, "committed usage fields to sqlite store");
        Ok(())
    }
}
