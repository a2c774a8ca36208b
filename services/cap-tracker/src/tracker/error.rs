use cap_watch_store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("cap limit must be greater than zero, got {0}")]
    CapLimit(i64),
    #[error("time frame must be a positive number of hours, got {0}")]
    TimeFrame(f64),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("usage store error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),
}

pub fn validate_cap_limit(limit: i64) -> Result<u64, ValidationError> {
    u64::try_from(limit)
        .ok()
        .filter(|limit| *limit > 0)
        .ok_or(ValidationError::CapLimit(limit))
}

pub fn validate_time_frame_hours(hours: f64) -> Result<f64, ValidationError> {
    if hours.is_finite() && hours > 0.0 {
        Ok(hours)
    } else {
        Err(ValidationError::TimeFrame(hours))
    }
}
