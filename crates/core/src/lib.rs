//! # Questline Core
//!
//! Pure session and reset logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) the infrastructure layer implements
//! - Reset schedule arithmetic (UTC only)
//! - The per-kind reset tracker state machine
//!
//! ## Architecture Principles
//! - Only depends on `questline-domain`
//! - No HTTP, filesystem, or runtime code
//! - All external dependencies via traits

pub mod resets;
pub mod session;

pub use resets::ports::{Clock, ResetTrigger, SystemClock};
pub use resets::schedule::{format_countdown, ResetSchedule};
pub use resets::tracker::{ResetTracker, SimulationPhase};
pub use session::ports::{Navigator, SessionScopedCache, SessionSnapshotStore};
