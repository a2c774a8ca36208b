use std::fmt;

use serde::{Deserialize, Serialize};

pub const LOW_REMAINING_THRESHOLD: i64 = 5;
pub const MEDIUM_REMAINING_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn classify(remaining: i64) -> Self {
        if remaining <= LOW_REMAINING_THRESHOLD {
            Severity::Low
        } else if remaining <= MEDIUM_REMAINING_THRESHOLD {
            Severity::Medium
        } else {
            Severity::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStatus {
    pub remaining: i64,
    pub time_left_seconds: u64,
    pub severity: Severity,
}

impl UsageStatus {
    /// Floors `time_left_ms` to whole seconds. Negative input reads as 0.
    pub fn new(remaining: i64, time_left_ms: i64) -> Self {
        let time_left_seconds = u64::try_from(time_left_ms / 1000).unwrap_or(0);

        Self {
            remaining,
            time_left_seconds,
            severity: Severity::classify(remaining),
        }
    }
}
