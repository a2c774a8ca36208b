use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UsageField {
    #[serde(rename = "capLimit")]
    CapLimit,
    #[serde(rename = "timeFrame")]
    TimeFrame,
    #[serde(rename = "messageCount")]
    MessageCount,
    #[serde(rename = "capStartTime")]
    CapStartTime,
}

impl UsageField {
    pub const ALL: [UsageField; 4] = [
        UsageField::CapLimit,
        UsageField::TimeFrame,
        UsageField::MessageCount,
        UsageField::CapStartTime,
    ];

    /// Flat key the field is persisted under.
    pub fn key(self) -> &'static str {
        match self {
            UsageField::CapLimit => "capLimit",
            UsageField::TimeFrame => "timeFrame",
            UsageField::MessageCount => "messageCount",
            UsageField::CapStartTime => "capStartTime",
        }
    }
}

impl fmt::Display for UsageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for UsageField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UsageField::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| format!("unknown usage field: {s}"))
    }
}

/// A partial mapping of usage fields to values. `None` means the field is
/// not part of the mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(rename = "capLimit", skip_serializing_if = "Option::is_none")]
    pub cap_limit: Option<u64>,
    #[serde(rename = "timeFrame", skip_serializing_if = "Option::is_none")]
    pub time_frame_hours: Option<f64>,
    #[serde(rename = "messageCount", skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u64>,
    #[serde(rename = "capStartTime", skip_serializing_if = "Option::is_none")]
    pub cap_start_time: Option<i64>,
}

impl UsageRecord {
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.fields().len() == UsageField::ALL.len()
    }

    pub fn contains(&self, field: UsageField) -> bool {
        match field {
            UsageField::CapLimit => self.cap_limit.is_some(),
            UsageField::TimeFrame => self.time_frame_hours.is_some(),
            UsageField::MessageCount => self.message_count.is_some(),
            UsageField::CapStartTime => self.cap_start_time.is_some(),
        }
    }

    pub fn fields(&self) -> Vec<UsageField> {
        UsageField::ALL
            .into_iter()
            .filter(|field| self.contains(*field))
            .collect()
    }

    /// Keeps only the listed fields.
    pub fn only(self, fields: &[UsageField]) -> UsageRecord {
        let keep = |field: UsageField| fields.contains(&field);
        UsageRecord {
            cap_limit: self.cap_limit.filter(|_| keep(UsageField::CapLimit)),
            time_frame_hours: self.time_frame_hours.filter(|_| keep(UsageField::TimeFrame)),
            message_count: self.message_count.filter(|_| keep(UsageField::MessageCount)),
            cap_start_time: self.cap_start_time.filter(|_| keep(UsageField::CapStartTime)),
        }
    }

    /// Present fields encoded as the JSON values backends persist.
    pub fn entries(&self) -> Vec<(UsageField, Value)> {
        let mut entries = Vec::with_capacity(UsageField::ALL.len());
        if let Some(limit) = self.cap_limit {
            entries.push((UsageField::CapLimit, Value::from(limit)));
        }
        if let Some(hours) = self.time_frame_hours {
            entries.push((UsageField::TimeFrame, Value::from(hours)));
        }
        if let Some(count) = self.message_count {
            entries.push((UsageField::MessageCount, Value::from(count)));
        }
        if let Some(start) = self.cap_start_time {
            entries.push((UsageField::CapStartTime, Value::from(start)));
        }
        entries
    }

    /// Decodes a persisted value into the matching field.
    pub fn insert(&mut self, field: UsageField, value: &Value) -> Result<(), StoreError> {
        match field {
            UsageField::CapLimit => self.cap_limit = Some(decode_count(field, value)?),
            UsageField::TimeFrame => {
                let hours = value
                    .as_f64()
                    .ok_or_else(|| StoreError::corrupt(field, format!("expected number, got {value}")))?;
                self.time_frame_hours = Some(hours);
            }
            UsageField::MessageCount => self.message_count = Some(decode_count(field, value)?),
            UsageField::CapStartTime => {
                // JavaScript clients may have written the stamp as a float.
                let start = value
                    .as_i64()
                    .or_else(|| {
                        value
                            .as_f64()
                            .filter(|millis| millis.is_finite())
                            .map(|millis| millis.trunc() as i64)
                    })
                    .ok_or_else(|| StoreError::corrupt(field, format!("expected epoch millis, got {value}")))?;
                self.cap_start_time = Some(start);
            }
        }
        Ok(())
    }
}

fn decode_count(field: UsageField, value: &Value) -> Result<u64, StoreError> {
    value
        .as_u64()
        .ok_or_else(|| StoreError::corrupt(field, format!("expected unsigned integer, got {value}")))
}
