//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `QUESTLINE_API_BASE_URL` is missing, falls back to loading from file
//! 3. Searches multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! - `QUESTLINE_API_BASE_URL`: API base URL (required for env mode)
//! - `QUESTLINE_API_TIMEOUT_SECS`: Whole-request timeout in seconds
//! - `QUESTLINE_USER_AGENT`: User agent sent with every request
//! - `QUESTLINE_DEVICE_NAME`: Device label sent with renewal requests
//! - `QUESTLINE_SESSION_DIR`: Directory holding the session snapshot
//! - `QUESTLINE_SESSION_KEY`: Snapshot key (file stem)
//! - `QUESTLINE_LOGIN_ROUTE`: Route the invalidation cascade redirects to
//! - `QUESTLINE_INVALIDATION_SETTLE_MS`: Invalidation guard settle delay
//! - `QUESTLINE_RESET_HOUR_UTC`: Reset hour (0-23)
//! - `QUESTLINE_RESET_WEEKDAY`: Weekly reset day, days from Sunday (0-6)
//! - `QUESTLINE_RESET_TICK_MS`: Reset scheduler tick interval
//! - `QUESTLINE_RESET_SIMULATE_LEAD_SECS`: Lead time of simulated resets
//!
//! ## File Locations
//! The loader searches the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./questline.json` or `./questline.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use questline_core::ResetSchedule;
use questline_domain::{Config, QuestlineError, Result};
use url::Url;

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the base URL is
/// not set there, falls back to loading from a config file.
///
/// # Errors
/// Returns `QuestlineError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value fails validation
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `QUESTLINE_API_BASE_URL` is required; every other variable falls
/// back to its default.
///
/// # Errors
/// Returns `QuestlineError::Config` if the base URL is missing or a value
/// is invalid.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.api.base_url = env_var("QUESTLINE_API_BASE_URL")?;
    config.api.request_timeout_secs = env_parse("QUESTLINE_API_TIMEOUT_SECS")?;
    config.api.user_agent = env_opt("QUESTLINE_USER_AGENT");
    config.api.device_name = env_opt("QUESTLINE_DEVICE_NAME");

    if let Some(dir) = env_opt("QUESTLINE_SESSION_DIR") {
        config.session.snapshot_dir = dir;
    }
    if let Some(key) = env_opt("QUESTLINE_SESSION_KEY") {
        config.session.snapshot_key = key;
    }
    if let Some(route) = env_opt("QUESTLINE_LOGIN_ROUTE") {
        config.session.login_route = route;
    }
    if let Some(settle) = env_parse("QUESTLINE_INVALIDATION_SETTLE_MS")? {
        config.session.invalidation_settle_ms = settle;
    }

    if let Some(hour) = env_parse("QUESTLINE_RESET_HOUR_UTC")? {
        config.resets.reset_hour_utc = hour;
    }
    if let Some(weekday) = env_parse("QUESTLINE_RESET_WEEKDAY")? {
        config.resets.weekly_reset_weekday = weekday;
    }
    if let Some(tick) = env_parse("QUESTLINE_RESET_TICK_MS")? {
        config.resets.tick_interval_ms = tick;
    }
    if let Some(lead) = env_parse("QUESTLINE_RESET_SIMULATE_LEAD_SECS")? {
        config.resets.simulate_lead_secs = lead;
    }

    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, searches multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`find_config_file`].
///
/// # Errors
/// Returns `QuestlineError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - A value fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(QuestlineError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => find_config_file().ok_or_else(|| {
            QuestlineError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| QuestlineError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    validate(&config)?;
    Ok(config)
}

/// Check values that serde alone cannot.
///
/// # Errors
/// Returns `QuestlineError::Config` for an unparseable base URL, a reset
/// hour outside `0..24`, a weekday outside `0..=6`, a zero tick interval or
/// a login route that is not absolute.
pub fn validate(config: &Config) -> Result<()> {
    let base = Url::parse(&config.api.base_url).map_err(|e| {
        QuestlineError::Config(format!("Invalid API base URL '{}': {e}", config.api.base_url))
    })?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(QuestlineError::Config(format!(
            "Unsupported API base URL scheme: {}",
            base.scheme()
        )));
    }

    ResetSchedule::from_config(&config.resets)?;

    if config.resets.tick_interval_ms == 0 {
        return Err(QuestlineError::Config("Reset tick interval must be positive".to_string()));
    }

    if !config.session.login_route.starts_with('/') {
        return Err(QuestlineError::Config(format!(
            "Login route must start with '/': {}",
            config.session.login_route
        )));
    }

    Ok(())
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `QuestlineError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| QuestlineError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| QuestlineError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(QuestlineError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Search multiple paths for a configuration file
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./questline.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn find_config_file() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("questline.json"),
        dir.join("questline.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `QuestlineError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        QuestlineError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Optional environment variable; empty counts as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an optional environment variable.
///
/// # Errors
/// Returns `QuestlineError::Config` if the variable is set but unparseable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| QuestlineError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}
