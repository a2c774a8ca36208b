use rusqlite::Connection;

use crate::error::StoreError;

pub const USAGE_FIELDS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS usage_fields (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

pub fn init_database(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(USAGE_FIELDS_TABLE_SCHEMA)?;
    Ok(())
}
