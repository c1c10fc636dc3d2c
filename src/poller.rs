//! The refresh loop.
//!
//! Cycles are strictly serialized: the cycle body is awaited inside the
//! interval loop, so a tick that fires while a cycle is still in flight is
//! suppressed (`MissedTickBehavior::Skip`) rather than queued into a burst.
//! Snapshots therefore reach the screen in cycle-start order and never
//! interleave.

use crate::client::BatchSource;
use crate::snapshot::{merge, DashboardSnapshot};
use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Everything the render loop reads each frame. The snapshot itself stays
/// untouched by failed cycles; the error lives beside it so stale data keeps
/// rendering with a status line instead of being replaced.
#[derive(Debug, Default)]
pub struct DashboardState {
    pub snapshot: Option<DashboardSnapshot>,
    pub cycles_completed: u64,
    pub last_error: Option<String>,
    pub last_updated: Option<DateTime<Local>>,
}

/// Shared handle between the poller task and the render loop.
pub type SharedState = Arc<Mutex<DashboardState>>;

/// Lock a mutex, recovering from poison if necessary. For a display-only
/// app the data behind a poisoned lock is still fine to read.
pub fn safe_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Owns the refresh cadence and the overlap policy.
pub struct Poller<S> {
    source: S,
    interval: Duration,
    state: SharedState,
}

impl<S: BatchSource> Poller<S> {
    pub fn new(source: S, interval: Duration, state: SharedState) -> Self {
        Self {
            source,
            interval,
            state,
        }
    }

    /// Run forever. The first cycle starts immediately; later cycles start
    /// at the interval, except that a cycle in flight suppresses the tick.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }

    /// One complete poll -> merge -> publish pass.
    ///
    /// A failed fetch abandons the cycle: logged, error recorded, snapshot
    /// left exactly as it was. There is no retry beyond the next tick.
    pub async fn run_cycle(&self) {
        match self.source.fetch_batch().await {
            Ok(batch) => {
                let previous = safe_lock(&self.state).snapshot.clone();
                let label = Local::now().format("%H:%M:%S").to_string();
                let next = merge(previous.as_ref(), &batch, label);

                let mut state = safe_lock(&self.state);
                state.snapshot = Some(next);
                state.cycles_completed += 1;
                state.last_error = None;
                state.last_updated = Some(Local::now());
                debug!(cycles = state.cycles_completed, "snapshot published");
            }
            Err(e) => {
                warn!("poll cycle abandoned: {e}");
                let mut state = safe_lock(&self.state);
                state.last_error = Some(e.to_string());
            }
        }
    }
}
