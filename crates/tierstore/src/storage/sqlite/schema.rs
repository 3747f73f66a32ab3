//! SQLite schema definitions and SQL query constants.

/// SQL statement to create the key/value table.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS store_entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

pub const SELECT_VALUE: &str = "SELECT value FROM store_entries WHERE key = ?1";

pub const UPSERT_VALUE: &str = r#"
INSERT INTO store_entries (key, value, updated_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(key) DO UPDATE SET
    value = excluded.value,
    updated_at = excluded.updated_at
"#;

pub const DELETE_VALUE: &str = "DELETE FROM store_entries WHERE key = ?1";

pub const DELETE_ALL: &str = "DELETE FROM store_entries";

pub const COUNT_ENTRIES: &str = "SELECT COUNT(*) FROM store_entries";
