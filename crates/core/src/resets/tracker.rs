//! Reset tracker state machine
//!
//! Each reset kind has two independent firing paths:
//!
//! - **Simulated**: an operator arms a near-term target. The kind moves
//!   `Idle -> Awaiting -> Firing -> Idle`; it is returned from
//!   [`ResetTracker::take_due`] at most once per arming.
//! - **Real**: the most recent scheduled boundary is compared with the one
//!   seen on the previous observation. The first observation only records.
//!
//! Every fired occurrence (a successful simulated trigger or an advanced real
//! boundary) bumps the refetch token by exactly one. The two paths are not
//! coalesced.

use chrono::{DateTime, Utc};
use questline_domain::{ResetKind, ResetStatus};
use tracing::{debug, info};

use super::schedule::{format_countdown, ResetSchedule};

/// Simulation state of one reset kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SimulationPhase {
    #[default]
    Idle,
    /// Armed; fires once the clock reaches the target
    Awaiting(DateTime<Utc>),
    /// Trigger call in progress
    Firing,
}

#[derive(Debug, Default)]
struct KindState {
    phase: SimulationPhase,
    last_real: Option<DateTime<Utc>>,
}

/// In-memory reset state. Never persisted: a restart must not replay stale
/// simulated occurrences.
#[derive(Debug)]
pub struct ResetTracker {
    schedule: ResetSchedule,
    daily: KindState,
    weekly: KindState,
    refetch_token: u64,
}

impl ResetTracker {
    #[must_use]
    pub fn new(schedule: ResetSchedule) -> Self {
        Self {
            schedule,
            daily: KindState::default(),
            weekly: KindState::default(),
            refetch_token: 0,
        }
    }

    #[must_use]
    pub fn schedule(&self) -> &ResetSchedule {
        &self.schedule
    }

    #[must_use]
    pub fn refetch_token(&self) -> u64 {
        self.refetch_token
    }

    #[must_use]
    pub fn phase(&self, kind: ResetKind) -> SimulationPhase {
        self.state(kind).phase
    }

    /// Arm a simulated occurrence of `kind` at `at`.
    ///
    /// Replaces a pending target. Returns `false` while a simulated trigger
    /// for `kind` is still in progress.
    pub fn simulate(&mut self, kind: ResetKind, at: DateTime<Utc>) -> bool {
        let state = self.state_mut(kind);
        if state.phase == SimulationPhase::Firing {
            return false;
        }
        state.phase = SimulationPhase::Awaiting(at);
        info!(%kind, %at, "simulated reset armed");
        true
    }

    /// Disarm a pending simulated occurrence. Returns whether one was pending.
    pub fn cancel_simulation(&mut self, kind: ResetKind) -> bool {
        let state = self.state_mut(kind);
        if matches!(state.phase, SimulationPhase::Awaiting(_)) {
            state.phase = SimulationPhase::Idle;
            true
        } else {
            false
        }
    }

    /// Kinds whose simulated target has been reached. Each returned kind is
    /// moved to `Firing` and must be finished with [`Self::complete`].
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<ResetKind> {
        let mut due = Vec::new();
        for kind in ResetKind::ALL {
            let state = self.state_mut(kind);
            if let SimulationPhase::Awaiting(at) = state.phase {
                if now >= at {
                    state.phase = SimulationPhase::Firing;
                    due.push(kind);
                }
            }
        }
        due
    }

    /// Finish a simulated firing. The target is cleared either way; the
    /// refetch token only moves when the trigger succeeded.
    pub fn complete(&mut self, kind: ResetKind, success: bool) -> bool {
        let state = self.state_mut(kind);
        if state.phase != SimulationPhase::Firing {
            return false;
        }
        state.phase = SimulationPhase::Idle;
        if success {
            self.refetch_token += 1;
            info!(%kind, refetch_token = self.refetch_token, "simulated reset fired");
        }
        success
    }

    /// Detect real occurrences that elapsed since the previous observation.
    pub fn observe_real(&mut self, now: DateTime<Utc>) -> Vec<ResetKind> {
        let mut fired = Vec::new();
        for kind in ResetKind::ALL {
            let latest = self.schedule.latest_occurrence(kind, now);
            let state = self.state_mut(kind);
            match state.last_real {
                None => {
                    debug!(%kind, %latest, "recording initial reset boundary");
                    state.last_real = Some(latest);
                }
                Some(previous) if latest > previous => {
                    state.last_real = Some(latest);
                    fired.push(kind);
                }
                Some(_) => {}
            }
        }

        for kind in &fired {
            self.refetch_token += 1;
            info!(kind = %kind, refetch_token = self.refetch_token, "real reset detected");
        }
        fired
    }

    /// Countdowns and refetch token as of `now`. A simulated target that is
    /// still in the future overrides the real schedule.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> ResetStatus {
        ResetStatus {
            daily: self.countdown(ResetKind::Daily, now),
            weekly: self.countdown(ResetKind::Weekly, now),
            refetch_token: self.refetch_token,
            simulated_daily_at: self.simulated_target(ResetKind::Daily),
            simulated_weekly_at: self.simulated_target(ResetKind::Weekly),
        }
    }

    fn countdown(&self, kind: ResetKind, now: DateTime<Utc>) -> String {
        let target = match self.simulated_target(kind) {
            Some(at) if at > now => at,
            _ => self.schedule.next_occurrence(kind, now),
        };
        format_countdown(target - now)
    }

    fn simulated_target(&self, kind: ResetKind) -> Option<DateTime<Utc>> {
        match self.state(kind).phase {
            SimulationPhase::Awaiting(at) => Some(at),
            SimulationPhase::Idle | SimulationPhase::Firing => None,
        }
    }

    fn state(&self, kind: ResetKind) -> &KindState {
        match kind {
            ResetKind::Daily => &self.daily,
            ResetKind::Weekly => &self.weekly,
        }
    }

    fn state_mut(&mut self, kind: ResetKind) -> &mut KindState {
        match kind {
            ResetKind::Daily => &mut self.daily,
            ResetKind::Weekly => &mut self.weekly,
        }
    }
}
