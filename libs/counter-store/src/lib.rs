//! Persistent key-value storage for a single usage window.
//!
//! The window lives in four flat fields (`capLimit`, `timeFrame`,
//! `messageCount`, `capStartTime`) inside one shared namespace. Every
//! backend implements [`CounterStore`]. A single `set` lands as one unit
//! and a single `get` reads one consistent snapshot, but nothing spans more
//! than one call, so concurrent writers resolve last-write-wins per field.

pub mod error;
pub mod memory;
pub mod record;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use record::{UsageField, UsageRecord};
pub use sqlite::SqliteStore;

pub const STORE_DB_FILENAME: &str = "cap_watch.db";

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Returns the requested fields that are present in the store.
    ///
    /// Absent fields stay `None`; backends never substitute defaults.
    async fn get(&self, fields: &[UsageField]) -> Result<UsageRecord, StoreError>;

    /// Writes every present field of `values` as one unit and resolves once
    /// the backend acknowledged the write.
    async fn set(&self, values: UsageRecord) -> Result<(), StoreError>;
}
