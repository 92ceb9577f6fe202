//! Translates session transitions into remote create/update calls.

use crate::api::TimeEntryApi;
use crate::api::dto::{CloseTimeEntry, NewTimeEntry};
use crate::core::clock::TimeSource;
use crate::errors::{AppError, AppResult};
use crate::models::session::Session;
use crate::models::user::User;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

pub struct SessionReconciler {
    api: Arc<dyn TimeEntryApi>,
    time: Arc<dyn TimeSource>,
    /// Closes confirmed by the backend in this process, by session id.
    closed: Mutex<HashMap<String, (CloseTimeEntry, Session)>>,
}

impl SessionReconciler {
    pub fn new(api: Arc<dyn TimeEntryApi>, time: Arc<dyn TimeSource>) -> Self {
        Self {
            api,
            time,
            closed: Mutex::new(HashMap::new()),
        }
    }

    pub fn time(&self) -> &Arc<dyn TimeSource> {
        &self.time
    }

    /// Resolve the acting user before any session operation.
    pub async fn resolve_user(&self, user_id: &str) -> AppResult<User> {
        let user = self.api.fetch_user(user_id).await?;
        if !user.is_active {
            return Err(AppError::Config(format!(
                "user '{}' is deactivated",
                user.display_name()
            )));
        }
        Ok(user)
    }

    /// Create the remote record for a new session, checked in now.
    pub async fn open(&self, user_id: &str) -> AppResult<Session> {
        self.open_at(user_id, self.time.now()).await
    }

    /// Create the remote record with an explicit check-in instant.
    pub async fn open_at(&self, user_id: &str, check_in: DateTime<Utc>) -> AppResult<Session> {
        let body = NewTimeEntry {
            user_id: user_id.to_string(),
            check_in,
        };
        let mut session = self.api.create_entry(&body).await?;

        if session.id.as_deref().is_none_or(str::is_empty) {
            return Err(AppError::Remote {
                status: 201,
                message: "created time entry has no id".into(),
            });
        }
        if session.user_id.is_empty() {
            session.user_id = body.user_id.clone();
        }

        info!(user = user_id, id = ?session.id, "remote session opened");
        Ok(session)
    }

    /// Close the remote record with the given end values.
    ///
    /// Re-submitting the values of a close that already succeeded returns the
    /// recorded result; submitting different values for it is rejected.
    pub async fn close(
        &self,
        session_id: &str,
        check_out: DateTime<Utc>,
        duration_minutes: i64,
    ) -> AppResult<Session> {
        if session_id.trim().is_empty() {
            error!("close requested without a remote session id");
            return Err(AppError::Invariant(
                "close requested without a remote session id".into(),
            ));
        }
        if duration_minutes < 0 {
            error!(duration_minutes, "negative duration submitted");
            return Err(AppError::Invariant(format!(
                "negative duration {} for session {}",
                duration_minutes, session_id
            )));
        }

        let body = CloseTimeEntry {
            check_out,
            duration_minutes,
        };

        let previous = self.closed_lock().get(session_id).cloned();
        if let Some((prev, session)) = previous {
            if prev == body {
                warn!(id = session_id, "duplicate close ignored");
                return Ok(session);
            }
            return Err(AppError::Invariant(format!(
                "session {} is already closed",
                session_id
            )));
        }

        let session = self.api.update_entry(session_id, &body).await?;
        self.closed_lock()
            .insert(session_id.to_string(), (body, session.clone()));

        info!(id = session_id, duration_minutes, "remote session closed");
        Ok(session)
    }

    /// Most recent open session of a user, if any.
    pub async fn current_for_user(&self, user_id: &str) -> AppResult<Option<Session>> {
        let entries = self.api.list_entries(Some(user_id)).await?;
        Ok(latest(entries.into_iter().filter(|s| s.user_id == user_id && s.is_open())))
    }

    /// One session of a user by its remote id.
    pub async fn find_session(&self, user_id: &str, session_id: &str) -> AppResult<Option<Session>> {
        let entries = self.api.list_entries(Some(user_id)).await?;
        Ok(entries
            .into_iter()
            .find(|s| s.id.as_deref() == Some(session_id)))
    }

    /// Open session of a user, else the most recent closed one.
    pub async fn latest_for_user(&self, user_id: &str) -> AppResult<Option<Session>> {
        let entries = self.api.list_entries(Some(user_id)).await?;
        Ok(pick_latest(entries.into_iter().filter(|s| s.user_id == user_id)))
    }

    /// Latest session per roster member, in roster order, with one list call.
    pub async fn team_sessions(&self, roster: &[String]) -> AppResult<Vec<(String, Option<Session>)>> {
        let entries = self.api.list_entries(None).await?;
        Ok(roster
            .iter()
            .map(|uid| {
                let s = pick_latest(entries.iter().filter(|s| &s.user_id == uid).cloned());
                (uid.clone(), s)
            })
            .collect())
    }

    /// Every session of one user (closed and open).
    pub async fn sessions_for_user(&self, user_id: &str) -> AppResult<Vec<Session>> {
        let entries = self.api.list_entries(Some(user_id)).await?;
        Ok(entries.into_iter().filter(|s| s.user_id == user_id).collect())
    }

    fn closed_lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (CloseTimeEntry, Session)>> {
        self.closed.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn latest(sessions: impl Iterator<Item = Session>) -> Option<Session> {
    sessions.max_by_key(|s| s.check_in)
}

/// Open sessions win over closed ones; otherwise the latest check-in.
fn pick_latest(sessions: impl Iterator<Item = Session>) -> Option<Session> {
    sessions.max_by_key(|s| (s.is_open(), s.check_in))
}
