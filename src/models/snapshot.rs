//! Typed mirror of the local "is a session open" state.

use chrono::{DateTime, Utc};

/// End values of a check-out that was sent but not confirmed yet. Kept so a
/// retry, even from a later process, submits exactly the same close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCheckOut {
    pub check_out: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl PendingCheckOut {
    /// The wall clock was behind the recorded start when the close was computed.
    pub fn is_anomalous(&self, started_at: DateTime<Utc>) -> bool {
        self.check_out < started_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSnapshot {
    pub started_at: DateTime<Utc>,
    pub remote_id: String,
    pub pending_close: Option<PendingCheckOut>,
}

/// Value written to the local session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSnapshot {
    Active(ActiveSnapshot),
    Inactive,
}

impl SessionSnapshot {
    pub fn active(started_at: DateTime<Utc>, remote_id: impl Into<String>) -> Self {
        SessionSnapshot::Active(ActiveSnapshot {
            started_at,
            remote_id: remote_id.into(),
            pending_close: None,
        })
    }

    /// Still active, with the close about to be sent.
    pub fn closing(
        started_at: DateTime<Utc>,
        remote_id: impl Into<String>,
        pending: PendingCheckOut,
    ) -> Self {
        SessionSnapshot::Active(ActiveSnapshot {
            started_at,
            remote_id: remote_id.into(),
            pending_close: Some(pending),
        })
    }
}

/// Value read back from the local session store.
///
/// `Empty` (nothing was ever written, or it was cleared) is distinct from an
/// explicit `Inactive`; partially written or undecodable data is `Corrupt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotRead {
    Empty,
    Inactive,
    Active(ActiveSnapshot),
    Corrupt(String),
}

impl SnapshotRead {
    pub fn is_active(&self) -> bool {
        matches!(self, SnapshotRead::Active(_))
    }

    pub fn active(&self) -> Option<&ActiveSnapshot> {
        match self {
            SnapshotRead::Active(s) => Some(s),
            _ => None,
        }
    }
}
