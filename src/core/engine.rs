//! Attendance session state machine.
//!
//! Ties the local store, the reconciler and the clock together:
//! `CheckedOut --check_in--> CheckedIn --check_out--> CheckedOut`, plus the
//! startup recovery that resumes a running session from the local snapshot
//! without touching the backend.

use crate::core::clock::{Clock, TimeSource, elapsed_since};
use crate::core::reconciler::SessionReconciler;
use crate::core::store::SessionStore;
use crate::errors::{AppError, AppResult};
use crate::models::session::{Session, WorkedMinutes};
use crate::models::snapshot::{PendingCheckOut, SessionSnapshot, SnapshotRead};
use crate::utils::format_hms;
use chrono::{DateTime, TimeDelta, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

pub const IDLE_DISPLAY: &str = "00:00:00";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    CheckedOut,
    CheckedIn {
        started_at: DateTime<Utc>,
        remote_id: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckInOutcome {
    CheckedIn(Session),
    /// Already checked in: nothing was sent to the backend.
    AlreadyCheckedIn { started_at: DateTime<Utc> },
    /// An open session already existed on the backend and was resumed.
    Resumed(Session),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Open remote session taken over while checked out locally.
    Adopted(Session),
    /// The running session was already closed on the backend; now checked out.
    ClosedRemotely(Session),
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutOutcome {
    pub session: Session,
    pub duration_minutes: i64,
    /// The wall clock was behind the recorded start; duration was clamped to 0.
    pub anomalous: bool,
}

/// Close values computed once and reused by retries.
#[derive(Debug, Clone)]
struct PendingClose {
    remote_id: String,
    values: PendingCheckOut,
}

struct Inner {
    user_id: String,
    store: Arc<dyn SessionStore>,
    reconciler: Arc<SessionReconciler>,
    time: Arc<dyn TimeSource>,
    clock: Clock,
    state: Mutex<EngineState>,
    pending_close: Mutex<Option<PendingClose>>,
    busy: AtomicBool,
    display: Arc<watch::Sender<String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

/// Held for the duration of a transition; frees the busy flag when dropped.
struct BusyGuard(Arc<Inner>);

impl BusyGuard {
    fn acquire(inner: &Arc<Inner>) -> AppResult<Self> {
        inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::Busy)?;
        Ok(Self(Arc::clone(inner)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.busy.store(false, Ordering::Release);
    }
}

pub struct AttendanceEngine {
    inner: Arc<Inner>,
}

impl AttendanceEngine {
    /// Build the engine for `user_id` and recover the state left by a
    /// previous run from the local store. Never calls the backend.
    ///
    /// Must be called from within a tokio runtime (the clock may start).
    pub fn load(
        user_id: impl Into<String>,
        store: Arc<dyn SessionStore>,
        reconciler: Arc<SessionReconciler>,
        tick: Duration,
    ) -> AppResult<Self> {
        let time = Arc::clone(reconciler.time());
        let (display, _) = watch::channel(IDLE_DISPLAY.to_string());
        let inner = Arc::new(Inner {
            user_id: user_id.into(),
            store,
            reconciler,
            clock: Clock::new(Arc::clone(&time), tick),
            time,
            state: Mutex::new(EngineState::CheckedOut),
            pending_close: Mutex::new(None),
            busy: AtomicBool::new(false),
            display: Arc::new(display),
        });

        match inner.store.read()? {
            SnapshotRead::Active(snap) => {
                info!(started_at = %snap.started_at, id = %snap.remote_id, "resuming running session");
                if let Some(values) = snap.pending_close {
                    info!(check_out = %values.check_out, "unconfirmed check-out from a previous run");
                    *lock(&inner.pending_close) = Some(PendingClose {
                        remote_id: snap.remote_id.clone(),
                        values,
                    });
                }
                inner.enter_checked_in(snap.started_at, snap.remote_id);
            }
            SnapshotRead::Empty | SnapshotRead::Inactive => {}
            SnapshotRead::Corrupt(reason) => {
                warn!(%reason, "local session snapshot is corrupt; starting checked out");
                if let Err(e) = inner.store.clear() {
                    warn!(error = %e, "could not clear corrupt snapshot");
                }
            }
        }

        Ok(Self { inner })
    }

    pub fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    pub fn state(&self) -> EngineState {
        lock(&self.inner.state).clone()
    }

    pub fn is_checked_in(&self) -> bool {
        matches!(self.state(), EngineState::CheckedIn { .. })
    }

    /// A transition is in flight; check-in/check-out controls should be disabled.
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    /// Latest `HH:MM:SS` published by the clock.
    pub fn elapsed_display(&self) -> String {
        self.inner.display.borrow().clone()
    }

    /// Elapsed time recomputed right now (zero when checked out).
    pub fn elapsed(&self) -> TimeDelta {
        match self.state() {
            EngineState::CheckedIn { started_at, .. } => {
                elapsed_since(self.inner.time.as_ref(), started_at)
            }
            EngineState::CheckedOut => TimeDelta::zero(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.inner.display.subscribe()
    }

    pub async fn check_in(&self) -> AppResult<CheckInOutcome> {
        if let EngineState::CheckedIn { started_at, .. } = self.state() {
            info!(user = %self.inner.user_id, "already checked in; no new session created");
            return Ok(CheckInOutcome::AlreadyCheckedIn { started_at });
        }
        self.run(|inner| async move { inner.check_in(false).await }).await
    }

    /// Like `check_in`, but first resumes an open session the backend already
    /// has for this user instead of opening a second one.
    pub async fn check_in_or_resume(&self) -> AppResult<CheckInOutcome> {
        if let EngineState::CheckedIn { started_at, .. } = self.state() {
            return Ok(CheckInOutcome::AlreadyCheckedIn { started_at });
        }
        self.run(|inner| async move { inner.check_in(true).await }).await
    }

    pub async fn check_out(&self) -> AppResult<CheckOutOutcome> {
        if !self.is_checked_in() {
            return Err(AppError::NotCheckedIn);
        }
        self.run(|inner| async move { inner.check_out().await }).await
    }

    /// When checked out, look for an open session on the backend (e.g. the
    /// local snapshot was lost) and resume it.
    pub async fn adopt_remote_session(&self) -> AppResult<Option<Session>> {
        if self.is_checked_in() {
            return Ok(None);
        }
        self.run(|inner| async move { inner.adopt().await }).await
    }

    /// Bring the local state in line with the backend: adopt an open session
    /// when checked out, or finish a running session the backend already closed.
    pub async fn sync_with_remote(&self) -> AppResult<SyncOutcome> {
        self.run(|inner| async move { inner.sync().await }).await
    }

    /// Stop the clock. The local snapshot is left untouched.
    pub fn shutdown(&self) {
        self.inner.clock.stop();
    }

    /// Run a transition on its own task: if the caller goes away mid-request
    /// the backend call still completes and the store is updated.
    async fn run<F, Fut, T>(&self, op: F) -> AppResult<T>
    where
        F: FnOnce(Arc<Inner>) -> Fut,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let guard = BusyGuard::acquire(&self.inner)?;
        let fut = op(Arc::clone(&self.inner));
        let task = tokio::spawn(async move {
            let _guard = guard;
            fut.await
        });
        task.await
            .map_err(|e| AppError::Other(format!("session task failed: {e}")))?
    }
}

impl Drop for AttendanceEngine {
    fn drop(&mut self) {
        self.inner.clock.stop();
    }
}

impl Inner {
    fn state(&self) -> EngineState {
        lock(&self.state).clone()
    }

    fn enter_checked_in(&self, started_at: DateTime<Utc>, remote_id: String) {
        *lock(&self.state) = EngineState::CheckedIn {
            started_at,
            remote_id,
        };
        self.display
            .send_replace(format_hms(elapsed_since(self.time.as_ref(), started_at)));

        let display = Arc::clone(&self.display);
        self.clock.start(started_at, move |elapsed| {
            display.send_replace(format_hms(elapsed));
        });
    }

    fn enter_checked_out(&self) {
        self.clock.stop();
        *lock(&self.state) = EngineState::CheckedOut;
        self.display.send_replace(IDLE_DISPLAY.to_string());
    }

    async fn check_in(self: Arc<Self>, resume_open: bool) -> AppResult<CheckInOutcome> {
        if let EngineState::CheckedIn { started_at, .. } = self.state() {
            return Ok(CheckInOutcome::AlreadyCheckedIn { started_at });
        }
        if resume_open && let Some(session) = Arc::clone(&self).adopt().await? {
            return Ok(CheckInOutcome::Resumed(session));
        }

        let started_at = self.time.now();
        // Nothing local changes unless the backend accepted the session.
        let session = self.reconciler.open_at(&self.user_id, started_at).await?;
        let remote_id = session.remote_id()?.to_string();

        self.enter_checked_in(started_at, remote_id.clone());
        if let Err(e) = self
            .store
            .write(&SessionSnapshot::active(started_at, remote_id))
        {
            error!(error = %e, "session opened remotely but the local snapshot was not saved");
            return Err(e);
        }

        info!(user = %self.user_id, id = ?session.id, "checked in");
        Ok(CheckInOutcome::CheckedIn(session))
    }

    /// Close values for `remote_id`: the ones already recorded for it, or new
    /// ones computed now and persisted before anything is sent.
    fn pending_for(&self, remote_id: &str, started_at: DateTime<Utc>) -> AppResult<PendingCheckOut> {
        let mut slot = lock(&self.pending_close);
        if let Some(p) = slot.as_ref().filter(|p| p.remote_id == remote_id) {
            return Ok(p.values);
        }

        let check_out = self.time.now();
        let worked = WorkedMinutes::between(started_at, check_out);
        if worked.anomalous {
            warn!(%started_at, %check_out, "clock moved backwards; duration clamped to 0");
        }
        let values = PendingCheckOut {
            check_out,
            duration_minutes: worked.minutes,
        };
        self.store
            .write(&SessionSnapshot::closing(started_at, remote_id, values))?;
        *slot = Some(PendingClose {
            remote_id: remote_id.to_string(),
            values,
        });
        Ok(values)
    }

    /// The backend holds a closed record for this session: local state follows.
    fn finish_check_out(&self) -> AppResult<()> {
        lock(&self.pending_close).take();
        self.enter_checked_out();
        self.store.write(&SessionSnapshot::Inactive)
    }

    async fn check_out(self: Arc<Self>) -> AppResult<CheckOutOutcome> {
        let EngineState::CheckedIn {
            started_at,
            remote_id,
        } = self.state()
        else {
            return Err(AppError::NotCheckedIn);
        };

        let pending = self.pending_for(&remote_id, started_at)?;

        let (session, duration_minutes) = match self
            .reconciler
            .close(&remote_id, pending.check_out, pending.duration_minutes)
            .await
        {
            Ok(s) => (s, pending.duration_minutes),
            Err(e) if e.is_transient() || e.is_defect() => {
                warn!(error = %e, id = %remote_id, "check-out failed; session stays open");
                return Err(e);
            }
            // Rejected outright: the record may have been closed by an
            // earlier attempt whose response never arrived.
            Err(e) => match self.reconciler.find_session(&self.user_id, &remote_id).await {
                Ok(Some(s)) if !s.is_open() => {
                    warn!(error = %e, id = %remote_id, "session already closed on the server; keeping its record");
                    let minutes = s.duration_minutes.unwrap_or(pending.duration_minutes);
                    (s, minutes)
                }
                _ => {
                    warn!(error = %e, id = %remote_id, "check-out failed; session stays open");
                    return Err(e);
                }
            },
        };

        self.finish_check_out()?;

        info!(user = %self.user_id, id = %remote_id, minutes = duration_minutes, "checked out");
        Ok(CheckOutOutcome {
            session,
            duration_minutes,
            anomalous: pending.is_anomalous(started_at),
        })
    }

    async fn sync(self: Arc<Self>) -> AppResult<SyncOutcome> {
        let EngineState::CheckedIn { remote_id, .. } = self.state() else {
            return Ok(match self.adopt().await? {
                Some(s) => SyncOutcome::Adopted(s),
                None => SyncOutcome::Unchanged,
            });
        };

        match self.reconciler.find_session(&self.user_id, &remote_id).await? {
            Some(s) if !s.is_open() => {
                warn!(id = %remote_id, "running session was closed on the server");
                self.finish_check_out()?;
                Ok(SyncOutcome::ClosedRemotely(s))
            }
            _ => Ok(SyncOutcome::Unchanged),
        }
    }

    async fn adopt(self: Arc<Self>) -> AppResult<Option<Session>> {
        if matches!(self.state(), EngineState::CheckedIn { .. }) {
            return Ok(None);
        }
        let Some(session) = self.reconciler.current_for_user(&self.user_id).await? else {
            return Ok(None);
        };
        let remote_id = session.remote_id()?.to_string();

        self.store
            .write(&SessionSnapshot::active(session.check_in, remote_id.clone()))?;
        self.enter_checked_in(session.check_in, remote_id);

        info!(user = %self.user_id, id = ?session.id, "adopted open remote session");
        Ok(Some(session))
    }
}
