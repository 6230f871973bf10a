//! Background scheduling
//!
//! The reset scheduler follows the usual lifecycle rules:
//! - Explicit `start`/`stop`
//! - Join handle kept for the spawned loop
//! - Cancellation token support
//! - Bounded wait when stopping

pub mod error;
pub mod reset_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use reset_scheduler::{ResetScheduler, ResetSchedulerConfig};
