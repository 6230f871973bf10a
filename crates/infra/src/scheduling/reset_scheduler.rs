//! Periodic reset scheduler
//!
//! Ticks once per interval (one second by default). Each tick:
//! 1. starts the server-side trigger for every simulated occurrence whose
//!    target has been reached, each on its own task;
//! 2. detects real occurrences that elapsed since the previous tick;
//! 3. publishes countdowns and the refetch token on a watch channel.
//!
//! A trigger task completes its occurrence and publishes again when the call
//! returns, so a slow trigger never holds up the countdowns. Stopping the
//! scheduler aborts triggers still in flight; their occurrences end without a
//! refetch.
//!
//! Views subscribe to the channel and refetch whenever the token moves.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex as SyncMutex;
use questline_core::{Clock, ResetSchedule, ResetTracker, ResetTrigger};
use questline_domain::{ResetConfig, ResetKind, ResetStatus};
use tokio::sync::{watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the reset scheduler
#[derive(Debug, Clone)]
pub struct ResetSchedulerConfig {
    /// Tick interval
    pub tick_interval: Duration,
    /// How far ahead `simulate` arms its target
    pub simulate_lead: Duration,
}

impl Default for ResetSchedulerConfig {
    fn default() -> Self {
        Self { tick_interval: Duration::from_secs(1), simulate_lead: Duration::from_secs(10) }
    }
}

impl From<&ResetConfig> for ResetSchedulerConfig {
    fn from(config: &ResetConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            simulate_lead: Duration::from_secs(config.simulate_lead_secs),
        }
    }
}

/// State shared between the scheduler handle and its tick loop
struct TickContext {
    tracker: SyncMutex<ResetTracker>,
    trigger: Arc<dyn ResetTrigger>,
    clock: Arc<dyn Clock>,
    status: watch::Sender<ResetStatus>,
}

impl TickContext {
    /// Spawn one trigger task per simulated occurrence that is due.
    fn fire_due(self: &Arc<Self>, triggers: &mut JoinSet<()>) {
        let due = self.tracker.lock().take_due(self.clock.now());
        for kind in due {
            let context = Arc::clone(self);
            triggers.spawn(async move { context.fire(kind).await });
        }
    }

    async fn fire(&self, kind: ResetKind) {
        let pending = PendingTrigger { context: self, kind, finished: false };

        let success = match self.trigger.trigger(kind).await {
            Ok(result) => {
                debug!(%kind, affected = result.affected, "simulated reset applied");
                true
            }
            Err(err) => {
                warn!(%kind, error = %err, "simulated reset trigger failed");
                false
            }
        };

        pending.finish(success);
    }

    fn observe(&self) {
        let now = self.clock.now();
        let fired = self.tracker.lock().observe_real(now);
        if !fired.is_empty() {
            info!(?fired, "reset boundary crossed");
        }

        self.publish(now);
    }

    fn publish(&self, now: DateTime<Utc>) {
        let status = self.tracker.lock().status(now);
        self.status.send_replace(status);
    }
}

/// Completes a firing occurrence exactly once. Dropped unfinished (the
/// trigger task was aborted), it ends the occurrence without a refetch.
struct PendingTrigger<'a> {
    context: &'a TickContext,
    kind: ResetKind,
    finished: bool,
}

impl PendingTrigger<'_> {
    fn finish(mut self, success: bool) {
        self.complete(success);
    }

    fn complete(&mut self, success: bool) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.context.tracker.lock().complete(self.kind, success);
        self.context.publish(self.context.clock.now());
    }
}

impl Drop for PendingTrigger<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(kind = %self.kind, "simulated reset trigger aborted");
            self.complete(false);
        }
    }
}

/// Reset scheduler
pub struct ResetScheduler {
    context: Arc<TickContext>,
    config: ResetSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl ResetScheduler {
    /// Create a new reset scheduler
    ///
    /// # Arguments
    ///
    /// * `schedule` - When real resets happen
    /// * `trigger` - Server-side trigger used for simulated occurrences
    /// * `clock` - Source of the current time
    /// * `config` - Scheduler configuration
    pub fn new(
        schedule: ResetSchedule,
        trigger: Arc<dyn ResetTrigger>,
        clock: Arc<dyn Clock>,
        config: ResetSchedulerConfig,
    ) -> Self {
        let tracker = ResetTracker::new(schedule);
        let (status, _) = watch::channel(tracker.status(clock.now()));

        Self {
            context: Arc::new(TickContext {
                tracker: SyncMutex::new(tracker),
                trigger,
                clock,
                status,
            }),
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the scheduler
    ///
    /// Spawns the tick loop. The first tick runs immediately and only
    /// records the current reset boundaries.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(tick_ms = self.config.tick_interval.as_millis(), "Starting reset scheduler");

        // Fresh token so the scheduler can restart after stop
        self.cancellation_token = CancellationToken::new();

        let context = Arc::clone(&self.context);
        let period = self.config.tick_interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::tick_loop(context, period, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        info!("Reset scheduler started");

        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// Cancels the tick loop and awaits completion.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is not running
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping reset scheduler");

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("Reset scheduler stopped");

        Ok(())
    }

    /// Check if scheduler is running
    ///
    /// A scheduler is considered running if it has an active task handle that
    /// hasn't finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Run one tick now and wait for the triggers it starts.
    pub async fn tick(&self) {
        let mut triggers = JoinSet::new();
        self.context.fire_due(&mut triggers);
        while triggers.join_next().await.is_some() {}
        self.context.observe();
    }

    /// Arm a simulated occurrence of `kind` one lead interval from now.
    pub fn simulate(&self, kind: ResetKind) -> bool {
        let lead = chrono::Duration::from_std(self.config.simulate_lead)
            .unwrap_or_else(|_| chrono::Duration::seconds(10));
        self.simulate_at(kind, self.context.clock.now() + lead)
    }

    /// Arm a simulated occurrence of `kind` at `at`.
    ///
    /// Returns `false` while the previous simulated trigger is still running.
    pub fn simulate_at(&self, kind: ResetKind, at: DateTime<Utc>) -> bool {
        let armed = self.context.tracker.lock().simulate(kind, at);
        self.context.publish(self.context.clock.now());
        armed
    }

    pub fn cancel_simulation(&self, kind: ResetKind) -> bool {
        let cancelled = self.context.tracker.lock().cancel_simulation(kind);
        self.context.publish(self.context.clock.now());
        cancelled
    }

    /// Status updates, published after every tick.
    pub fn subscribe(&self) -> watch::Receiver<ResetStatus> {
        self.context.status.subscribe()
    }

    /// Status as of now.
    pub fn status(&self) -> ResetStatus {
        self.context.tracker.lock().status(self.context.clock.now())
    }

    pub fn refetch_token(&self) -> u64 {
        self.context.tracker.lock().refetch_token()
    }

    async fn tick_loop(context: Arc<TickContext>, period: Duration, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut triggers = JoinSet::new();

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Reset tick loop cancelled");
                    break;
                }
                _ = interval.tick() => {
                    context.fire_due(&mut triggers);
                    context.observe();
                }
                Some(joined) = triggers.join_next(), if !triggers.is_empty() => {
                    if let Err(err) = joined {
                        warn!(error = %err, "reset trigger task failed");
                    }
                }
            }
        }

        if !triggers.is_empty() {
            info!(in_flight = triggers.len(), "aborting reset triggers");
        }
        triggers.shutdown().await;
    }
}

/// Ensure scheduler is stopped when dropped
impl Drop for ResetScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() && self.is_running() {
            warn!("ResetScheduler dropped while running; cancelling");
        }
        self.cancellation_token.cancel();
    }
}
