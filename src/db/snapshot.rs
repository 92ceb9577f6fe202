//! Raw access to the `local_state` key/value rows.
//! Decoding into a typed snapshot happens in `core::store`.

use crate::errors::AppResult;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;

pub const KEY_ACTIVE: &str = "active";
pub const KEY_STARTED_AT: &str = "started_at";
pub const KEY_REMOTE_ID: &str = "remote_id";
pub const KEY_CLOSE_AT: &str = "close_at";
pub const KEY_CLOSE_MINUTES: &str = "close_minutes";

pub const SNAPSHOT_KEYS: [&str; 5] = [
    KEY_ACTIVE,
    KEY_STARTED_AT,
    KEY_REMOTE_ID,
    KEY_CLOSE_AT,
    KEY_CLOSE_MINUTES,
];

/// Replace the snapshot keys as one unit.
/// `None` values are deleted so no stale field survives a rewrite.
pub fn replace_snapshot(conn: &mut Connection, values: &[(&str, Option<String>)]) -> AppResult<()> {
    let tx = conn.transaction()?;
    let now = Utc::now().to_rfc3339();
    for (key, value) in values {
        match value {
            Some(v) => {
                tx.execute(
                    "INSERT INTO local_state (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    params![key, v, now],
                )?;
            }
            None => {
                tx.execute("DELETE FROM local_state WHERE key = ?1", [key])?;
            }
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn load_snapshot(conn: &Connection) -> AppResult<HashMap<String, String>> {
    let mut out = HashMap::new();
    for key in SNAPSHOT_KEYS {
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM local_state WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(v) = value {
            out.insert(key.to_string(), v);
        }
    }
    Ok(out)
}

pub fn clear_snapshot(conn: &mut Connection) -> AppResult<()> {
    let values: Vec<(&str, Option<String>)> = SNAPSHOT_KEYS.iter().map(|k| (*k, None)).collect();
    replace_snapshot(conn, &values)
}
