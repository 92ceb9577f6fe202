use super::session::{AttendanceStatus, Session};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Present,
    Break,
    Absent,
}

impl PresenceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PresenceStatus::Present => "present",
            PresenceStatus::Break => "break",
            PresenceStatus::Absent => "absent",
        }
    }
}

/// One user's current (or most recent) session with its classification.
#[derive(Debug, Clone)]
pub struct PresenceInput {
    pub user_id: String,
    pub status: PresenceStatus,
    pub session: Option<Session>,
}

impl PresenceInput {
    pub fn new(user_id: impl Into<String>, status: PresenceStatus, session: Option<Session>) -> Self {
        Self {
            user_id: user_id.into(),
            status,
            session,
        }
    }

    /// Classify a user from the latest session the backend knows about:
    /// - open session → present
    /// - closed today → break (stepped out, may come back)
    /// - anything else → absent
    pub fn from_session(user_id: impl Into<String>, session: Option<Session>, today: NaiveDate) -> Self {
        let status = match &session {
            Some(s) if s.status == AttendanceStatus::Absent => PresenceStatus::Absent,
            Some(s) if s.is_open() => PresenceStatus::Present,
            Some(s) if s.check_out.map(|t| t.date_naive()) == Some(today) => PresenceStatus::Break,
            _ => PresenceStatus::Absent,
        };
        Self::new(user_id, status, session)
    }
}

/// Derived presence row, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceEntry {
    pub user_id: String,
    pub status: PresenceStatus,
    pub since: Option<DateTime<Utc>>,
    pub elapsed_display: String,
}
