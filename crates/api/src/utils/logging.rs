use std::time::Duration;

use questline_domain::QuestlineError;
use questline_infra::{ApiError, ApiErrorCategory};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,questline_infra=debug";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Setting `QUESTLINE_LOG_JSON`
/// switches to one JSON object per line. Calling this twice is harmless; the
/// second install is ignored.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("QUESTLINE_LOG_JSON").is_ok_and(|v| v != "0" && !v.is_empty());

    let result = if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"auth::login"`).
/// * `elapsed` - Duration the command execution took.
/// * `error` - Stable error label when the command failed.
///
/// Callers must avoid forwarding sensitive values in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, error: Option<&str>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(command, duration_ms, "command_execution_success"),
        Some(error) => warn!(command, duration_ms, error, "command_execution_failure"),
    }
}

/// Convert a `QuestlineError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &QuestlineError) -> &'static str {
    match error {
        QuestlineError::Config(_) => "config",
        QuestlineError::Network(_) => "network",
        QuestlineError::Auth(_) => "auth",
        QuestlineError::Storage(_) => "storage",
        QuestlineError::NotFound(_) => "not_found",
        QuestlineError::InvalidInput(_) => "invalid_input",
        QuestlineError::Internal(_) => "internal",
    }
}

/// Stable label for an API call failure.
#[inline]
pub fn api_error_label(error: &ApiError) -> &'static str {
    match error.category() {
        ApiErrorCategory::Authentication => "authentication",
        ApiErrorCategory::Server => "server",
        ApiErrorCategory::Client => "client",
        ApiErrorCategory::Network => "network",
        ApiErrorCategory::Cancelled => "cancelled",
        ApiErrorCategory::Config => "config",
    }
}
