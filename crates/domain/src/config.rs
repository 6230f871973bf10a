//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_INVALIDATION_SETTLE_MS, DEFAULT_LOGIN_ROUTE,
    DEFAULT_RESET_HOUR_UTC, DEFAULT_RESET_TICK_MS, DEFAULT_SESSION_DIR, DEFAULT_SESSION_KEY,
    DEFAULT_SIMULATE_LEAD_SECS, DEFAULT_WEEKLY_RESET_WEEKDAY, ROUTE_DAILY_RESET, ROUTE_LOGIN,
    ROUTE_LOGOUT, ROUTE_LOGOUT_ALL, ROUTE_ME, ROUTE_REFRESH, ROUTE_WEEKLY_RESET,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub resets: ResetConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Whole-request timeout. `None` leaves the transport defaults in charge.
    pub request_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    /// Sent with renewal requests so the server can label the refresh token
    pub device_name: Option<String>,
    pub routes: ApiRoutes,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: None,
            user_agent: None,
            device_name: None,
            routes: ApiRoutes::default(),
        }
    }
}

/// Relative paths of the endpoints the session layer talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiRoutes {
    pub login: String,
    pub refresh: String,
    pub logout: String,
    pub logout_all: String,
    pub me: String,
    pub daily_reset: String,
    pub weekly_reset: String,
}

impl Default for ApiRoutes {
    fn default() -> Self {
        Self {
            login: ROUTE_LOGIN.to_string(),
            refresh: ROUTE_REFRESH.to_string(),
            logout: ROUTE_LOGOUT.to_string(),
            logout_all: ROUTE_LOGOUT_ALL.to_string(),
            me: ROUTE_ME.to_string(),
            daily_reset: ROUTE_DAILY_RESET.to_string(),
            weekly_reset: ROUTE_WEEKLY_RESET.to_string(),
        }
    }
}

/// Session persistence and invalidation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding the persisted session snapshot
    pub snapshot_dir: String,
    /// Namespaced key the snapshot is stored under
    pub snapshot_key: String,
    /// Unauthenticated entry point the cascade redirects to
    pub login_route: String,
    /// How long the invalidation guard stays held after a redirect
    pub invalidation_settle_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: DEFAULT_SESSION_DIR.to_string(),
            snapshot_key: DEFAULT_SESSION_KEY.to_string(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            invalidation_settle_ms: DEFAULT_INVALIDATION_SETTLE_MS,
        }
    }
}

/// Periodic reset schedule configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetConfig {
    pub reset_hour_utc: u32,
    /// Days from Sunday (0 = Sunday ... 6 = Saturday)
    pub weekly_reset_weekday: u32,
    pub tick_interval_ms: u64,
    pub simulate_lead_secs: u64,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            reset_hour_utc: DEFAULT_RESET_HOUR_UTC,
            weekly_reset_weekday: DEFAULT_WEEKLY_RESET_WEEKDAY,
            tick_interval_ms: DEFAULT_RESET_TICK_MS,
            simulate_lead_secs: DEFAULT_SIMULATE_LEAD_SECS,
        }
    }
}
