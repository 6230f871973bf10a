//! Reset countdown and simulation commands

use std::time::Instant;

use questline_core::ResetTrigger;
use questline_domain::{ResetKind, ResetResult, ResetStatus};

use crate::context::AppContext;
use crate::utils::logging::{error_label, log_command_execution};

/// Countdowns and refetch token as of now.
pub async fn reset_status(ctx: &AppContext) -> ResetStatus {
    ctx.scheduler.lock().await.status()
}

/// Arm a simulated reset of `kind` one lead interval from now.
///
/// The scheduler calls the server-side trigger once the target is reached.
pub async fn simulate_reset(ctx: &AppContext, kind: &str) -> Result<ResetStatus, String> {
    let start = Instant::now();
    let result = match parse_kind(kind) {
        Ok(kind) => {
            let scheduler = ctx.scheduler.lock().await;
            if scheduler.simulate(kind) {
                Ok(scheduler.status())
            } else {
                Err(format!("A simulated {kind} reset is already running"))
            }
        }
        Err(e) => Err(e),
    };

    let label = result.as_ref().err().map(|_| "invalid_input");
    log_command_execution("resets::simulate_reset", start.elapsed(), label);
    result
}

/// Disarm a pending simulated reset. Returns whether one was pending.
pub async fn cancel_simulated_reset(ctx: &AppContext, kind: &str) -> Result<bool, String> {
    let kind = parse_kind(kind)?;
    Ok(ctx.scheduler.lock().await.cancel_simulation(kind))
}

/// Call the server-side trigger for `kind` right away.
///
/// Does not move the refetch token; only the scheduler does that.
pub async fn trigger_reset(ctx: &AppContext, kind: &str) -> Result<ResetResult, String> {
    let start = Instant::now();
    let kind = parse_kind(kind)?;

    let result = ctx.resets.trigger(kind).await;

    let label = result.as_ref().err().map(error_label);
    log_command_execution("resets::trigger_reset", start.elapsed(), label);
    result.map_err(|e| e.to_string())
}

fn parse_kind(kind: &str) -> Result<ResetKind, String> {
    kind.parse::<ResetKind>()
}
