use std::sync::Arc;

pub mod handlers;
pub mod router;
pub mod types;

pub use handlers::*;
pub use router::create_router;
pub use types::*;

use crate::config::TrackerConfig;
use crate::refresh::StatusBoard;
use crate::tracker::UsageWindowTracker;

pub struct ApiState {
    pub tracker: UsageWindowTracker,
    pub board: StatusBoard,
    pub config: Arc<TrackerConfig>,
}

impl ApiState {
    pub fn new(tracker: UsageWindowTracker, board: StatusBoard, config: TrackerConfig) -> Self {
        Self {
            tracker,
            board,
            config: Arc::new(config),
        }
    }
}
