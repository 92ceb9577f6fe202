use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Input-level classification carried by every time entry.
/// The engine only ever creates `Present`; the others are passed through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    HalfDay,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::HalfDay => "half_day",
        }
    }
}

/// One check-in/check-out attendance record, as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub check_in: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_out: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.check_out.is_none()
    }

    /// The backend id; closing a record that never got one is a bug.
    pub fn remote_id(&self) -> AppResult<&str> {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(AppError::Invariant(format!(
                "session of user '{}' has no remote id",
                self.user_id
            ))),
        }
    }

    /// Day the session belongs to: explicit `date` if the server sent one,
    /// otherwise the check-in day.
    pub fn day(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| self.check_in.date_naive())
    }
}

/// Whole minutes between two instants, truncated.
///
/// A negative difference (wall clock moved backwards) is clamped to zero and
/// reported as anomalous instead of producing a negative record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkedMinutes {
    pub minutes: i64,
    pub anomalous: bool,
}

impl WorkedMinutes {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let diff = end - start;
        if diff < chrono::TimeDelta::zero() {
            Self {
                minutes: 0,
                anomalous: true,
            }
        } else {
            Self {
                minutes: diff.num_minutes(),
                anomalous: false,
            }
        }
    }
}
