use std::io;

use thiserror::Error;

use crate::record::UsageField;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("stored value for {field} is corrupt: {reason}")]
    Corrupt { field: UsageField, reason: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn corrupt(field: UsageField, reason: impl ToString) -> Self {
        Self::Corrupt {
            field,
            reason: reason.to_string(),
        }
    }
}
