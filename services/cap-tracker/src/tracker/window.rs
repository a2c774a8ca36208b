use cap_watch_store::{UsageField, UsageRecord};
use serde::{Deserialize, Serialize};

use super::{DEFAULT_CAP_LIMIT, DEFAULT_TIME_FRAME_HOURS, MS_PER_HOUR};

/// Window configuration that survives resets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub cap_limit: u64,
    pub time_frame_hours: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            cap_limit: DEFAULT_CAP_LIMIT,
            time_frame_hours: DEFAULT_TIME_FRAME_HOURS,
        }
    }
}

impl WindowConfig {
    /// Completes `stored` with defaults, returning the full window and the
    /// fields that had to be filled in.
    pub fn fill(&self, stored: UsageRecord, now_ms: i64) -> (UsageWindow, Vec<UsageField>) {
        let missing = UsageField::ALL
            .into_iter()
            .filter(|field| !stored.contains(*field))
            .collect();

        let window = UsageWindow {
            cap_limit: stored.cap_limit.unwrap_or(self.cap_limit),
            time_frame_hours: stored.time_frame_hours.unwrap_or(self.time_frame_hours),
            message_count: stored.message_count.unwrap_or(0),
            cap_start_time: stored.cap_start_time.unwrap_or(now_ms),
        };

        (window, missing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Active,
    Expired,
}

/// Fully populated snapshot of the persisted window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageWindow {
    pub cap_limit: u64,
    pub time_frame_hours: f64,
    pub message_count: u64,
    pub cap_start_time: i64,
}

impl UsageWindow {
    pub fn window_ms(&self) -> i64 {
        (self.time_frame_hours * MS_PER_HOUR as f64).round() as i64
    }

    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.cap_start_time)
    }

    pub fn state(&self, now_ms: i64) -> WindowState {
        if self.elapsed_ms(now_ms) >= self.window_ms() {
            WindowState::Expired
        } else {
            WindowState::Active
        }
    }

    /// Events left before the advisory cap. Negative once the cap is overrun.
    pub fn remaining(&self) -> i64 {
        let limit = i64::try_from(self.cap_limit).unwrap_or(i64::MAX);
        let count = i64::try_from(self.message_count).unwrap_or(i64::MAX);
        limit.saturating_sub(count)
    }

    pub fn time_left_ms(&self, now_ms: i64) -> i64 {
        self.window_ms()
            .saturating_sub(self.elapsed_ms(now_ms))
            .max(0)
    }

    pub fn to_record(&self) -> UsageRecord {
        UsageRecord {
            cap_limit: Some(self.cap_limit),
            time_frame_hours: Some(self.time_frame_hours),
            message_count: Some(self.message_count),
            cap_start_time: Some(self.cap_start_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(message_count: u64, cap_start_time: i64) -> UsageWindow {
        UsageWindow {
            cap_limit: 25,
            time_frame_hours: 1.0,
            message_count,
            cap_start_time,
        }
    }

    #[test]
    fn window_expires_exactly_at_time_frame() {
        let w = window(0, 0);
        assert_eq!(w.state(MS_PER_HOUR - 1), WindowState::Active);
        assert_eq!(w.state(MS_PER_HOUR), WindowState::Expired);
        assert_eq!(w.state(2 * MS_PER_HOUR), WindowState::Expired);
    }

    #[test]
    fn fractional_hours_convert_to_millis() {
        let w = UsageWindow {
            time_frame_hours: 0.25,
            ..window(0, 0)
        };
        assert_eq!(w.window_ms(), 15 * 60 * 1000);
    }

    #[test]
    fn remaining_goes_negative_past_cap() {
        assert_eq!(window(28, 0).remaining(), -3);
        assert_eq!(window(25, 0).remaining(), 0);
    }

    #[test]
    fn time_left_never_negative() {
        let w = window(0, 0);
        assert_eq!(w.time_left_ms(MS_PER_HOUR / 2), MS_PER_HOUR / 2);
        assert_eq!(w.time_left_ms(3 * MS_PER_HOUR), 0);
    }

    #[test]
    fn fill_reports_missing_fields_and_keeps_stored_values() {
        let stored = UsageRecord {
            cap_limit: Some(40),
            message_count: Some(3),
            ..UsageRecord::default()
        };

        let (window, missing) = WindowConfig::default().fill(stored, 99);
        assert_eq!(window.cap_limit, 40);
        assert_eq!(window.time_frame_hours, DEFAULT_TIME_FRAME_HOURS);
        assert_eq!(window.message_count, 3);
        assert_eq!(window.cap_start_time, 99);
        assert_eq!(missing, vec![UsageField::TimeFrame, UsageField::CapStartTime]);
    }

    #[test]
    fn fill_on_complete_record_reports_nothing_missing() {
        let stored = window(5, 10).to_record();
        let (filled, missing) = WindowConfig::default().fill(stored, 99);
        assert_eq!(filled, window(5, 10));
        assert!(missing.is_empty());
    }
}
