use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::badge::Badge;
use crate::tracker::{TrackerError, UsageStatus, UsageWindowTracker};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardEntry {
    pub status: UsageStatus,
    pub badge: Badge,
    pub refreshed_at: DateTime<Utc>,
}

/// Last successfully computed status, as currently displayed.
#[derive(Clone, Default)]
pub struct StatusBoard {
    current: Arc<RwLock<Option<BoardEntry>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<BoardEntry> {
        self.current.read().await.clone()
    }

    /// Recomputes the status. On failure the previous entry stays in place.
    pub async fn refresh(&self, tracker: &UsageWindowTracker) -> Result<BoardEntry, TrackerError> {
        let status = match tracker.compute_status().await {
            Ok(status) => status,
            Err(err) => {
                warn!(error = %err, "status refresh failed, keeping previous badge");
                return Err(err);
            }
        };

        let entry = BoardEntry {
            status,
            badge: Badge::from_status(&status),
            refreshed_at: Utc::now(),
        };
        *self.current.write().await = Some(entry.clone());

        debug!(
            remaining = status.remaining,
            severity = %status.severity,
            time_left_seconds = status.time_left_seconds,
            "status board refreshed"
        );
        Ok(entry)
    }
}

/// Refreshes `board` every `period` and whenever `changes` is notified.
pub fn start_refresh_task(
    tracker: UsageWindowTracker,
    board: StatusBoard,
    period: Duration,
    changes: Arc<Notify>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = changes.notified() => {}
            }

            // Failures are already logged; the next tick retries.
            let _ = board.refresh(&tracker).await;
        }
    })
}
