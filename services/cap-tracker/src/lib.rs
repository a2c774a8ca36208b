pub mod api;
pub mod badge;
pub mod config;
pub mod refresh;
pub mod tracker;

pub use api::{create_router, ApiState, ErrorResponse, StatusResponse};
pub use badge::Badge;
pub use config::{StoreBackend, TrackerConfig};
pub use refresh::{start_refresh_task, BoardEntry, StatusBoard};
pub use tracker::{
    Clock, ManualClock, Severity, SystemClock, TrackerError, UsageStatus, UsageWindow,
    UsageWindowTracker, ValidationError, WindowConfig, WindowState,
};
