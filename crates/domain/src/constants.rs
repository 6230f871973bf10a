//! Application constants
//!
//! Defaults shared by the configuration structs and the services that read
//! them.

// API routes
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const ROUTE_LOGIN: &str = "/api/auth/login";
pub const ROUTE_REFRESH: &str = "/api/auth/refresh";
pub const ROUTE_LOGOUT: &str = "/api/auth/logout";
pub const ROUTE_LOGOUT_ALL: &str = "/api/auth/logout-all";
pub const ROUTE_ME: &str = "/api/auth/me";
pub const ROUTE_DAILY_RESET: &str = "/api/reset/daily";
pub const ROUTE_WEEKLY_RESET: &str = "/api/reset/weekly";

// Session
pub const DEFAULT_SESSION_KEY: &str = "questline.session";
pub const DEFAULT_SESSION_DIR: &str = ".questline";
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_INVALIDATION_SETTLE_MS: u64 = 500;

// Resets (US region: 15:00 UTC, weekly on Tuesday)
pub const DEFAULT_RESET_HOUR_UTC: u32 = 15;
/// Days from Sunday (0 = Sunday, 2 = Tuesday).
pub const DEFAULT_WEEKLY_RESET_WEEKDAY: u32 = 2;
pub const DEFAULT_RESET_TICK_MS: u64 = 1_000;
pub const DEFAULT_SIMULATE_LEAD_SECS: u64 = 10;
