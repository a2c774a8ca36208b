use std::sync::Arc;

use cap_watch_store::{CounterStore, StoreError, UsageField, UsageRecord};
use tracing::{debug, error, info};

use super::clock::{Clock, SystemClock};
use super::error::{validate_cap_limit, validate_time_frame_hours, TrackerError};
use super::status::UsageStatus;
use super::window::{UsageWindow, WindowConfig, WindowState};

/// Invoked after a state-changing operation has been persisted.
pub type ChangeNotifier = Arc<dyn Fn() + Send + Sync>;

/// Tracks events in the current usage window.
///
/// Holds no copy of the window: every operation goes back to the store, so
/// independently constructed trackers sharing one store stay consistent
/// with each other (modulo lost updates between concurrent writers).
#[derive(Clone)]
pub struct UsageWindowTracker {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    defaults: WindowConfig,
    notifier: Option<ChangeNotifier>,
}

impl UsageWindowTracker {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            defaults: WindowConfig::default(),
            notifier: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_defaults(mut self, defaults: WindowConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_notifier<F>(mut self, notifier: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Populates any missing field with its default. Fields already in the
    /// store are left alone, so repeated calls never restart a window.
    pub async fn initialize(&self) -> Result<UsageWindow, TrackerError> {
        let stored = self
            .store
            .get(&UsageField::ALL)
            .await
            .map_err(store_failure("initialize"))?;
        let window = self.populate(stored, self.clock.now_ms()).await?;

        info!(
            cap_limit = window.cap_limit,
            time_frame_hours = window.time_frame_hours,
            message_count = window.message_count,
            "usage window initialized"
        );
        self.notify();
        Ok(window)
    }

    /// Current window, populating defaults first if the store is incomplete.
    pub async fn window(&self) -> Result<UsageWindow, TrackerError> {
        self.window_at(self.clock.now_ms()).await
    }

    pub async fn config(&self) -> Result<WindowConfig, TrackerError> {
        let stored = self
            .store
            .get(&[UsageField::CapLimit, UsageField::TimeFrame])
            .await
            .map_err(store_failure("read_config"))?;

        Ok(WindowConfig {
            cap_limit: stored.cap_limit.unwrap_or(self.defaults.cap_limit),
            time_frame_hours: stored
                .time_frame_hours
                .unwrap_or(self.defaults.time_frame_hours),
        })
    }

    /// Counts one event and returns the new count.
    ///
    /// The cap is advisory: events past the limit are still recorded. The
    /// first event of a window restarts the window clock, so the window
    /// starts at first use rather than at initialization.
    pub async fn record_event(&self) -> Result<u64, TrackerError> {
        let current = self
            .store
            .get(&[UsageField::MessageCount, UsageField::CapLimit])
            .await
            .map_err(store_failure("record_event"))?;

        let previous = current.message_count.unwrap_or(0);
        let cap_limit = current.cap_limit.unwrap_or(self.defaults.cap_limit);
        let message_count = previous.saturating_add(1);

        let mut update = UsageRecord {
            message_count: Some(message_count),
            ..UsageRecord::default()
        };
        if previous == 0 {
            update.cap_start_time = Some(self.clock.now_ms());
        }

        self.store
            .set(update)
            .await
            .map_err(store_failure("record_event"))?;

        if message_count > cap_limit {
            debug!(message_count, cap_limit, "event recorded past advisory cap");
        } else {
            debug!(message_count, cap_limit, "event recorded");
        }
        self.notify();
        Ok(message_count)
    }

    /// Remaining quota for the current window.
    ///
    /// An expired window is rolled over first, so a just-expired window
    /// reports a full quota. Time left is measured against the window as it
    /// was read, which makes it 0 on the call that performs the rollover.
    pub async fn compute_status(&self) -> Result<UsageStatus, TrackerError> {
        let now = self.clock.now_ms();
        let window = self.window_at(now).await?;
        let time_left_ms = window.time_left_ms(now);

        let remaining = match window.state(now) {
            WindowState::Active => window.remaining(),
            WindowState::Expired => self.roll_over(&window, now).await?.remaining(),
        };

        Ok(UsageStatus::new(remaining, time_left_ms))
    }

    /// The `Expired -> Reset` transition at `now`. Returns the window as
    /// re-read after the reset was persisted.
    pub async fn roll_over(
        &self,
        expired: &UsageWindow,
        now: i64,
    ) -> Result<UsageWindow, TrackerError> {
        info!(
            elapsed_ms = expired.elapsed_ms(now),
            message_count = expired.message_count,
            "usage window expired, rolling over"
        );

        self.write_reset(now, "roll_over").await?;
        self.window_at(now).await
    }

    /// Clears the count and restarts the window clock. Configuration is kept.
    pub async fn reset(&self) -> Result<(), TrackerError> {
        let now = self.clock.now_ms();
        self.write_reset(now, "reset").await?;

        info!(cap_start_time = now, "usage window reset");
        self.notify();
        Ok(())
    }

    pub async fn set_cap_limit(&self, limit: i64) -> Result<(), TrackerError> {
        let cap_limit = validate_cap_limit(limit)?;

        self.store
            .set(UsageRecord {
                cap_limit: Some(cap_limit),
                ..UsageRecord::default()
            })
            .await
            .map_err(store_failure("set_cap_limit"))?;

        info!(cap_limit, "cap limit updated");
        self.notify();
        Ok(())
    }

    pub async fn set_time_frame_hours(&self, hours: f64) -> Result<(), TrackerError> {
        let time_frame_hours = validate_time_frame_hours(hours)?;

        self.store
            .set(UsageRecord {
                time_frame_hours: Some(time_frame_hours),
                ..UsageRecord::default()
            })
            .await
            .map_err(store_failure("set_time_frame_hours"))?;

        info!(time_frame_hours, "time frame updated");
        self.notify();
        Ok(())
    }

    async fn window_at(&self, now: i64) -> Result<UsageWindow, TrackerError> {
        let stored = self
            .store
            .get(&UsageField::ALL)
            .await
            .map_err(store_failure("read_window"))?;
        self.populate(stored, now).await
    }

    async fn populate(&self, stored: UsageRecord, now: i64) -> Result<UsageWindow, TrackerError> {
        let (window, missing) = self.defaults.fill(stored, now);
        if missing.is_empty() {
            return Ok(window);
        }

        self.store
            .set(window.to_record().only(&missing))
            .await
            .map_err(store_failure("populate_defaults"))?;

        debug!(fields = ?missing, "populated missing usage fields with defaults");
        Ok(window)
    }

    // Count and start time go out in one write so no reader sees one without the other.
    async fn write_reset(&self, now: i64, operation: &'static str) -> Result<(), TrackerError> {
        self.store
            .set(UsageRecord {
                message_count: Some(0),
                cap_start_time: Some(now),
                ..UsageRecord::default()
            })
            .await
            .map_err(store_failure(operation))
    }

    fn notify(&self) {
        if let Some(notifier) = &self.notifier {
            notifier();
        }
    }
}

fn store_failure(operation: &'static str) -> impl FnOnce(StoreError) -> TrackerError {
    move |err| {
        error!(operation, error = %err, "usage store operation failed");
        TrackerError::Store(err)
    }
}
