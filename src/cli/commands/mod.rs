pub mod check_in;
pub mod check_out;
pub mod config;
pub mod init;
pub mod log;
pub mod presence;
pub mod status;
pub mod summary;
pub mod watch;

use crate::api::HttpTimeEntryApi;
use crate::config::Config;
use crate::core::clock::SystemTimeSource;
use crate::core::engine::AttendanceEngine;
use crate::core::reconciler::SessionReconciler;
use crate::core::store::SqliteSessionStore;
use crate::db::log::ttlog;
use crate::errors::AppResult;
use std::sync::Arc;
use std::time::Duration;

/// Collaborators shared by the session commands.
pub struct Wiring {
    pub store: Arc<SqliteSessionStore>,
    pub reconciler: Arc<SessionReconciler>,
}

impl Wiring {
    pub fn from_config(cfg: &Config) -> AppResult<Self> {
        let store = Arc::new(SqliteSessionStore::open(cfg.database_path())?);
        let api = HttpTimeEntryApi::new(
            &cfg.api_base_url,
            Duration::from_secs(cfg.request_timeout_secs),
        )?;
        let reconciler = Arc::new(SessionReconciler::new(
            Arc::new(api),
            Arc::new(SystemTimeSource),
        ));
        Ok(Self { store, reconciler })
    }

    /// Recover the acting user's engine from the local snapshot.
    pub fn engine(&self, cfg: &Config) -> AppResult<AttendanceEngine> {
        AttendanceEngine::load(
            cfg.require_user()?,
            self.store.clone(),
            Arc::clone(&self.reconciler),
            Duration::from_millis(cfg.tick_interval_ms),
        )
    }

    /// Append to the internal log; failures only warn.
    pub fn record(&self, operation: &str, target: &str, message: &str) {
        if let Err(e) = self
            .store
            .with_pool(|pool| ttlog(&pool.conn, operation, target, message))
        {
            eprintln!("⚠️ Failed to write internal log: {}", e);
        }
    }
}
