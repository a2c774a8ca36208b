use serde::{Deserialize, Serialize};

use crate::badge::Badge;
use crate::tracker::{Severity, UsageStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub remaining: i64,
    pub time_left_seconds: u64,
    pub severity: Severity,
    pub badge: Badge,
}

impl From<UsageStatus> for StatusResponse {
    fn from(status: UsageStatus) -> Self {
        Self {
            remaining: status.remaining,
            time_left_seconds: status.time_left_seconds,
            severity: status.severity,
            badge: Badge::from_status(&status),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEventResponse {
    pub message_count: u64,
    pub status: StatusResponse,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateConfigRequest {
    pub cap_limit: Option<i64>,
    pub time_frame_hours: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub cap_limit: u64,
    pub time_frame_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub details: Option<serde_json::Value>,
}
