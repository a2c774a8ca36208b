pub mod clock;
pub mod error;
pub mod manager;
pub mod status;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{TrackerError, ValidationError};
pub use manager::{ChangeNotifier, UsageWindowTracker};
pub use status::{Severity, UsageStatus};
pub use window::{UsageWindow, WindowConfig, WindowState};

pub const DEFAULT_CAP_LIMIT: u64 = 25;
pub const DEFAULT_TIME_FRAME_HOURS: f64 = 3.0;
pub const MS_PER_HOUR: i64 = 60 * 60 * 1000;
