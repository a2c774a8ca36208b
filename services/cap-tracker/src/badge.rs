use serde::{Deserialize, Serialize};

use crate::tracker::{Severity, UsageStatus};

pub const TEXT_COLOR: &str = "#FFFFFF";
pub const LOW_BADGE_COLOR: &str = "#F44336";
pub const MEDIUM_BADGE_COLOR: &str = "#FF9800";
pub const HIGH_BADGE_COLOR: &str = "#4CAF50";

/// Display attributes derived from a [`UsageStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub text: String,
    pub text_color: String,
    pub background_color: String,
    pub title: String,
}

impl Badge {
    pub fn from_status(status: &UsageStatus) -> Self {
        Self {
            text: status.remaining.to_string(),
            text_color: TEXT_COLOR.to_string(),
            background_color: severity_color(status.severity).to_string(),
            title: format!(
                "Remaining messages: {}\nTime left: {} seconds",
                status.remaining,
                group_thousands(status.time_left_seconds)
            ),
        }
    }
}

pub fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => LOW_BADGE_COLOR,
        Severity::Medium => MEDIUM_BADGE_COLOR,
        Severity::High => HIGH_BADGE_COLOR,
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_uses_severity_palette() {
        let status = UsageStatus {
            remaining: 5,
            time_left_seconds: 10_800,
            severity: Severity::Low,
        };

        let badge = Badge::from_status(&status);
        assert_eq!(badge.text, "5");
        assert_eq!(badge.text_color, TEXT_COLOR);
        assert_eq!(badge.background_color, LOW_BADGE_COLOR);
        assert_eq!(badge.title, "Remaining messages: 5\nTime left: 10,800 seconds");
    }

    #[test]
    fn negative_remaining_renders_sign() {
        let status = UsageStatus {
            remaining: -3,
            time_left_seconds: 59,
            severity: Severity::Low,
        };

        assert_eq!(Badge::from_status(&status).text, "-3");
    }

    #[test]
    fn colors_per_severity() {
        assert_eq!(severity_color(Severity::Medium), MEDIUM_BADGE_COLOR);
        assert_eq!(severity_color(Severity::High), HIGH_BADGE_COLOR);
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }
}
