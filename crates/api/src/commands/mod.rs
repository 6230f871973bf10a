//! Application commands - view to backend bridge
//!
//! Every command logs its outcome through
//! [`log_command_execution`](crate::utils::logging::log_command_execution)
//! and reports failures as display strings ready for the view.

mod auth;
mod resets;

pub use auth::*;
pub use resets::*;
