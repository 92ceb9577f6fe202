//! Repeating elapsed-time ticker.
//!
//! The clock never owns session state: it only recomputes `now - origin`
//! every period and hands the value to a callback. Cancellation is explicit
//! (`stop`) and also happens when the clock is dropped.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Source of "now". Injected so tests and recovery logic share one notion of time.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Elapsed since `origin`, clamped at zero.
pub fn elapsed_since(time: &dyn TimeSource, origin: DateTime<Utc>) -> TimeDelta {
    (time.now() - origin).max(TimeDelta::zero())
}

struct Ticker {
    origin: DateTime<Utc>,
    handle: JoinHandle<()>,
}

pub struct Clock {
    time: Arc<dyn TimeSource>,
    period: Duration,
    ticker: Mutex<Option<Ticker>>,
}

impl Clock {
    pub fn new(time: Arc<dyn TimeSource>, period: Duration) -> Self {
        Self {
            time,
            period,
            ticker: Mutex::new(None),
        }
    }

    fn ticker(&self) -> MutexGuard<'_, Option<Ticker>> {
        self.ticker.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Start ticking from `origin`. A running ticker is replaced, so starting
    /// twice from the same origin shows the same value, never a sum.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&self, origin: DateTime<Utc>, mut on_tick: F)
    where
        F: FnMut(TimeDelta) + Send + 'static,
    {
        let time = Arc::clone(&self.time);
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last = TimeDelta::zero();
            loop {
                interval.tick().await;
                let elapsed = elapsed_since(time.as_ref(), origin).max(last);
                last = elapsed;
                on_tick(elapsed);
            }
        });

        if let Some(old) = self.ticker().replace(Ticker { origin, handle }) {
            old.handle.abort();
        }
        tracing::debug!(%origin, "clock started");
    }

    /// Cancel further ticks. Safe to call when not running.
    pub fn stop(&self) {
        if let Some(t) = self.ticker().take() {
            t.handle.abort();
            tracing::debug!(origin = %t.origin, "clock stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker()
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    pub fn origin(&self) -> Option<DateTime<Utc>> {
        self.ticker().as_ref().map(|t| t.origin)
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.stop();
    }
}
