use std::sync::Arc;

use anyhow::{Context, Result};
use cap_watch_store::{CounterStore, MemoryStore, SqliteStore};
use cap_watch_tracker::{ManualClock, UsageWindowTracker, WindowConfig};
use tempfile::TempDir;
use tracing::debug;

pub use cap_watch_store;
pub use cap_watch_tracker;

pub const FIXTURE_START_MS: i64 = 1_700_000_000_000;

/// A shared store plus a manual clock; every tracker handed out reads and
/// writes the same namespace, like several open tabs.
pub struct TrackerFixture {
    pub store: Arc<dyn CounterStore>,
    pub clock: ManualClock,
    pub defaults: WindowConfig,
    _temp_dir: Option<TempDir>,
}

impl TrackerFixture {
    pub fn memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            clock: ManualClock::new(FIXTURE_START_MS),
            defaults: WindowConfig::default(),
            _temp_dir: None,
        }
    }

    pub fn sqlite() -> Result<Self> {
        let temp_dir = TempDir::new().context("creating sqlite fixture tempdir")?;
        let store = SqliteStore::open(temp_dir.path()).context("opening sqlite fixture store")?;
        debug!(path = %temp_dir.path().display(), "sqlite fixture ready");

        Ok(Self {
            store: Arc::new(store),
            clock: ManualClock::new(FIXTURE_START_MS),
            defaults: WindowConfig::default(),
            _temp_dir: Some(temp_dir),
        })
    }

    pub fn with_store(store: Arc<dyn CounterStore>) -> Self {
        Self {
            store,
            clock: ManualClock::new(FIXTURE_START_MS),
            defaults: WindowConfig::default(),
            _temp_dir: None,
        }
    }

    pub fn with_defaults(mut self, defaults: WindowConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn tracker(&self) -> UsageWindowTracker {
        UsageWindowTracker::new(Arc::clone(&self.store))
            .with_clock(Arc::new(self.clock.clone()))
            .with_defaults(self.defaults)
    }

    pub fn tabs(&self, count: usize) -> Vec<UsageWindowTracker> {
        (0..count).map(|_| self.tracker()).collect()
    }

    /// Fixture whose window already holds `events` recorded events.
    pub async fn with_events(self, events: u64) -> Result<Self> {
        let tracker = self.tracker();
        tracker.initialize().await?;
        for _ in 0..events {
            tracker.record_event().await?;
        }
        Ok(self)
    }
}
