#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rattendance::api::TimeEntryApi;
use rattendance::api::dto::{CloseTimeEntry, NewTimeEntry};
use rattendance::core::clock::TimeSource;
use rattendance::core::engine::AttendanceEngine;
use rattendance::core::reconciler::SessionReconciler;
use rattendance::core::store::SessionStore;
use rattendance::errors::{AppError, AppResult};
use rattendance::models::session::Session;
use rattendance::models::user::User;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub fn rti() -> Command {
    cargo_bin_cmd!("rattendance")
}

/// Temporary HOME plus a database path inside it.
pub struct Sandbox {
    pub home: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().expect("temp home"),
        }
    }

    pub fn db(&self) -> String {
        self.db_path().to_string_lossy().to_string()
    }

    pub fn db_path(&self) -> PathBuf {
        self.home.path().join("attendance.sqlite")
    }

    /// `rattendance` with HOME redirected and the test database selected.
    /// The backend URL points at a closed port so nothing leaves the machine.
    pub fn cmd(&self) -> Command {
        let mut cmd = rti();
        cmd.env("HOME", self.home.path())
            .env("APPDATA", self.home.path())
            .env_remove("RUST_LOG")
            .args(["--db", &self.db(), "--api", "http://127.0.0.1:9/api"]);
        cmd
    }

    pub fn init(&self) {
        self.cmd().args(["--test", "init"]).assert().success();
    }
}

pub fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 20, h, m, s).unwrap()
}

/// Wall clock pinned to `base` that moves with tokio's (paused) clock, plus
/// a manual offset to simulate the system clock being changed.
pub struct TestTime {
    base: DateTime<Utc>,
    start: tokio::time::Instant,
    offset: Mutex<TimeDelta>,
}

impl TestTime {
    pub fn new(base: DateTime<Utc>) -> Self {
        Self {
            base,
            start: tokio::time::Instant::now(),
            offset: Mutex::new(TimeDelta::zero()),
        }
    }

    pub fn shift(&self, by: TimeDelta) {
        *self.offset.lock().unwrap() += by;
    }
}

impl TimeSource for TestTime {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.start.elapsed()).unwrap();
        self.base + elapsed + *self.offset.lock().unwrap()
    }
}

/// Scripted in-memory time-entry backend.
#[derive(Default)]
pub struct FakeApi {
    pub sessions: Mutex<Vec<Session>>,
    pub users: Mutex<HashMap<String, User>>,
    /// Every close attempt, including the failed ones.
    pub close_attempts: Mutex<Vec<(String, CloseTimeEntry)>>,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub fail_creates: AtomicUsize,
    pub fail_updates: AtomicUsize,
    pub latency: Mutex<Option<Duration>>,
    /// Answer creates with a record that carries no id.
    pub omit_ids: AtomicBool,
    next_id: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        let api = Self::default();
        api.add_user("3", "Ada", "Lovelace", true);
        Arc::new(api)
    }

    pub fn add_user(&self, id: &str, first: &str, last: &str, active: bool) {
        self.users.lock().unwrap().insert(
            id.to_string(),
            User {
                id: id.to_string(),
                first_name: first.to_string(),
                last_name: last.to_string(),
                role: Some("agent".into()),
                is_active: active,
            },
        );
    }

    pub fn seed(&self, session: Session) {
        self.sessions.lock().unwrap().push(session);
    }

    /// Close a record directly, as if an earlier close landed but its
    /// response was lost.
    pub fn close_directly(&self, id: &str, check_out: DateTime<Utc>, minutes: i64) {
        let mut sessions = self.sessions.lock().unwrap();
        let s = sessions
            .iter_mut()
            .find(|s| s.id.as_deref() == Some(id))
            .expect("known session");
        s.check_out = Some(check_out);
        s.duration_minutes = Some(minutes);
    }

    pub fn set_latency(&self, d: Duration) {
        *self.latency.lock().unwrap() = Some(d);
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn session(&self, id: &str) -> Option<Session> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id.as_deref() == Some(id))
            .cloned()
    }

    async fn delay(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(d) = latency {
            tokio::time::sleep(d).await;
        }
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn unavailable() -> AppError {
        AppError::Remote {
            status: 503,
            message: "Service Unavailable".into(),
        }
    }
}

#[async_trait]
impl TimeEntryApi for FakeApi {
    async fn create_entry(&self, entry: &NewTimeEntry) -> AppResult<Session> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if Self::take_failure(&self.fail_creates) {
            return Err(Self::unavailable());
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = (!self.omit_ids.load(Ordering::SeqCst)).then(|| format!("time-{n}"));
        let session = Session {
            id,
            user_id: entry.user_id.clone(),
            check_in: entry.check_in,
            check_out: None,
            duration_minutes: None,
            status: Default::default(),
            date: Some(entry.check_in.date_naive()),
            notes: None,
        };
        self.seed(session.clone());
        Ok(session)
    }

    async fn update_entry(&self, id: &str, close: &CloseTimeEntry) -> AppResult<Session> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.close_attempts
            .lock()
            .unwrap()
            .push((id.to_string(), close.clone()));
        self.delay().await;
        if Self::take_failure(&self.fail_updates) {
            return Err(Self::unavailable());
        }
        let mut sessions = self.sessions.lock().unwrap();
        let Some(s) = sessions.iter_mut().find(|s| s.id.as_deref() == Some(id)) else {
            return Err(AppError::Remote {
                status: 404,
                message: format!("time entry {id} not found"),
            });
        };
        if !s.is_open() {
            return Err(AppError::Remote {
                status: 409,
                message: "time entry already closed".into(),
            });
        }
        s.check_out = Some(close.check_out);
        s.duration_minutes = Some(close.duration_minutes);
        Ok(s.clone())
    }

    async fn list_entries(&self, user_id: Option<&str>) -> AppResult<Vec<Session>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| user_id.is_none_or(|u| s.user_id == u))
            .cloned()
            .collect())
    }

    async fn fetch_user(&self, id: &str) -> AppResult<User> {
        self.users
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::Remote {
                status: 404,
                message: format!("user {id} not found"),
            })
    }
}

/// One "installation": a backend, a wall clock and a local store shared by
/// every engine built from it, the way successive page loads share them.
pub struct Harness {
    pub api: Arc<FakeApi>,
    pub time: Arc<TestTime>,
    pub store: Arc<dyn SessionStore>,
}

impl Harness {
    pub fn new(store: Arc<dyn SessionStore>, base: DateTime<Utc>) -> Self {
        Self {
            api: FakeApi::new(),
            time: Arc::new(TestTime::new(base)),
            store,
        }
    }

    pub fn reconciler(&self) -> Arc<SessionReconciler> {
        Arc::new(SessionReconciler::new(self.api.clone(), self.time.clone()))
    }

    /// Fresh engine and reconciler over the shared store (a reload).
    pub fn engine(&self) -> AttendanceEngine {
        AttendanceEngine::load(
            "3",
            self.store.clone(),
            self.reconciler(),
            Duration::from_secs(1),
        )
        .expect("engine loads")
    }
}

/// Let spawned tasks (clock ticks, transitions) run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

pub fn closed_session(id: &str, user: &str, start: DateTime<Utc>, minutes: i64) -> Session {
    Session {
        id: Some(id.to_string()),
        user_id: user.to_string(),
        check_in: start,
        check_out: Some(start + TimeDelta::minutes(minutes)),
        duration_minutes: Some(minutes),
        status: Default::default(),
        date: None,
        notes: None,
    }
}

pub fn open_session(id: &str, user: &str, start: DateTime<Utc>) -> Session {
    Session {
        check_out: None,
        duration_minutes: None,
        ..closed_session(id, user, start, 0)
    }
}
