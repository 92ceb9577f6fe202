//! Local session store: the durable mirror of "is a session open, since
//! when, under which remote id" that must survive a restart.

use crate::db::pool::DbPool;
use crate::db::snapshot::{
    KEY_ACTIVE, KEY_CLOSE_AT, KEY_CLOSE_MINUTES, KEY_REMOTE_ID, KEY_STARTED_AT, SNAPSHOT_KEYS,
    clear_snapshot, load_snapshot, replace_snapshot,
};
use crate::errors::AppResult;
use crate::models::snapshot::{ActiveSnapshot, PendingCheckOut, SessionSnapshot, SnapshotRead};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Synchronous key/value persistence for the session snapshot.
pub trait SessionStore: Send + Sync {
    fn write(&self, snapshot: &SessionSnapshot) -> AppResult<()>;
    fn read(&self) -> AppResult<SnapshotRead>;
    fn clear(&self) -> AppResult<()>;
}

fn encode(snapshot: &SessionSnapshot) -> Vec<(&'static str, Option<String>)> {
    match snapshot {
        SessionSnapshot::Active(a) => vec![
            (KEY_ACTIVE, Some("true".to_string())),
            (KEY_STARTED_AT, Some(a.started_at.to_rfc3339())),
            (KEY_REMOTE_ID, Some(a.remote_id.clone())),
            (KEY_CLOSE_AT, a.pending_close.map(|p| p.check_out.to_rfc3339())),
            (
                KEY_CLOSE_MINUTES,
                a.pending_close.map(|p| p.duration_minutes.to_string()),
            ),
        ],
        SessionSnapshot::Inactive => vec![
            (KEY_ACTIVE, Some("false".to_string())),
            (KEY_STARTED_AT, None),
            (KEY_REMOTE_ID, None),
            (KEY_CLOSE_AT, None),
            (KEY_CLOSE_MINUTES, None),
        ],
    }
}

/// Decode the raw rows once, at the boundary.
pub fn decode(raw: &HashMap<String, String>) -> SnapshotRead {
    if raw.is_empty() {
        return SnapshotRead::Empty;
    }

    let Some(flag) = raw.get(KEY_ACTIVE) else {
        return SnapshotRead::Corrupt("session fields present without an active flag".into());
    };

    match flag.as_str() {
        "false" => SnapshotRead::Inactive,
        "true" => {
            let Some(started) = raw.get(KEY_STARTED_AT) else {
                return SnapshotRead::Corrupt("active flag set without a start instant".into());
            };
            let started_at = match DateTime::parse_from_rfc3339(started) {
                Ok(t) => t.with_timezone(&Utc),
                Err(e) => {
                    return SnapshotRead::Corrupt(format!("unreadable start instant '{started}': {e}"));
                }
            };
            let remote_id = match raw.get(KEY_REMOTE_ID) {
                Some(id) if !id.trim().is_empty() => id.clone(),
                _ => {
                    return SnapshotRead::Corrupt(
                        "active flag set without a remote session id".into(),
                    );
                }
            };
            match decode_pending(raw) {
                Ok(pending_close) => SnapshotRead::Active(ActiveSnapshot {
                    started_at,
                    remote_id,
                    pending_close,
                }),
                Err(reason) => SnapshotRead::Corrupt(reason),
            }
        }
        other => SnapshotRead::Corrupt(format!("unexpected active flag '{other}'")),
    }
}

/// Both close fields or neither.
fn decode_pending(raw: &HashMap<String, String>) -> Result<Option<PendingCheckOut>, String> {
    match (raw.get(KEY_CLOSE_AT), raw.get(KEY_CLOSE_MINUTES)) {
        (None, None) => Ok(None),
        (Some(at), Some(minutes)) => {
            let check_out = DateTime::parse_from_rfc3339(at)
                .map_err(|e| format!("unreadable pending check-out '{at}': {e}"))?
                .with_timezone(&Utc);
            let duration_minutes = minutes
                .parse::<i64>()
                .ok()
                .filter(|m| *m >= 0)
                .ok_or_else(|| format!("bad pending duration '{minutes}'"))?;
            Ok(Some(PendingCheckOut {
                check_out,
                duration_minutes,
            }))
        }
        _ => Err("pending check-out is only partially recorded".into()),
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Snapshot stored in the local SQLite database.
pub struct SqliteSessionStore {
    pool: Mutex<DbPool>,
}

impl SqliteSessionStore {
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        Ok(Self::new(DbPool::open(path)?))
    }

    pub fn new(pool: DbPool) -> Self {
        Self {
            pool: Mutex::new(pool),
        }
    }

    /// Run `f` against the underlying connection (internal log, diagnostics).
    pub fn with_pool<T>(&self, f: impl FnOnce(&mut DbPool) -> AppResult<T>) -> AppResult<T> {
        f(&mut lock(&self.pool))
    }
}

impl SessionStore for SqliteSessionStore {
    fn write(&self, snapshot: &SessionSnapshot) -> AppResult<()> {
        let values = encode(snapshot);
        lock(&self.pool).with_conn(|conn| replace_snapshot(conn, &values))
    }

    fn read(&self) -> AppResult<SnapshotRead> {
        let raw = lock(&self.pool).with_conn(|conn| load_snapshot(conn))?;
        Ok(decode(&raw))
    }

    fn clear(&self) -> AppResult<()> {
        lock(&self.pool).with_conn(clear_snapshot)
    }
}

/// Snapshot kept in memory only, with the same decoding contract.
#[derive(Default)]
pub struct MemorySessionStore {
    raw: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a single raw key, bypassing the unit write.
    pub fn put_raw(&self, key: &str, value: &str) {
        lock(&self.raw).insert(key.to_string(), value.to_string());
    }
}

impl SessionStore for MemorySessionStore {
    fn write(&self, snapshot: &SessionSnapshot) -> AppResult<()> {
        let mut raw = lock(&self.raw);
        for (key, value) in encode(snapshot) {
            match value {
                Some(v) => {
                    raw.insert(key.to_string(), v);
                }
                None => {
                    raw.remove(key);
                }
            }
        }
        Ok(())
    }

    fn read(&self) -> AppResult<SnapshotRead> {
        Ok(decode(&lock(&self.raw)))
    }

    fn clear(&self) -> AppResult<()> {
        let mut raw = lock(&self.raw);
        for key in SNAPSHOT_KEYS {
            raw.remove(key);
        }
        Ok(())
    }
}
