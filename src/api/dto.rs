use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /time-entries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTimeEntry {
    pub user_id: String,
    pub check_in: DateTime<Utc>,
}

/// Body of `PUT /time-entries/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseTimeEntry {
    pub check_out: DateTime<Utc>,
    pub duration_minutes: i64,
}

/// Error payload some backends return alongside a non-2xx status.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(alias = "error")]
    pub message: String,
}
