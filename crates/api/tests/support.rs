//! Shared fixtures for the application-layer integration tests.

use std::path::Path;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use questline_core::SystemClock;
use questline_domain::{Config, Session, SessionUser};
use questline_infra::MemorySnapshotStore;
use questline_lib::AppContext;
use serde_json::{json, Value};

/// Configuration pointing every route at `base_url`, with short timings.
pub fn test_config(base_url: &str, snapshot_dir: &Path) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.api.request_timeout_secs = Some(10);
    config.session.snapshot_dir = snapshot_dir.to_string_lossy().to_string();
    config.session.snapshot_key = "questline.test".to_string();
    config.session.invalidation_settle_ms = 100;
    config.resets.tick_interval_ms = 50;
    config.resets.simulate_lead_secs = 0;
    config
}

/// Context backed by an in-memory snapshot.
pub fn memory_context(base_url: &str) -> (AppContext, Arc<MemorySnapshotStore>) {
    let snapshots = Arc::new(MemorySnapshotStore::new());
    let config = test_config(base_url, Path::new("unused"));
    let ctx = AppContext::with_parts(config, snapshots.clone(), Arc::new(SystemClock))
        .expect("context builds");
    (ctx, snapshots)
}

pub fn session(access: &str, refresh: &str) -> Session {
    Session {
        user: SessionUser {
            user_id: "u-7".to_string(),
            email: "jaina@example.test".to_string(),
            user_name: "Jaina".to_string(),
            is_admin: false,
        },
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        access_token_expires_at: Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(),
    }
}

pub fn login_body(access: &str, refresh: &str) -> Value {
    json!({
        "userId": "u-7",
        "email": "jaina@example.test",
        "userName": "Jaina",
        "isAdmin": false,
        "accessToken": access,
        "refreshToken": refresh,
        "accessTokenExpiresAt": "2026-06-01T12:00:00Z"
    })
}

pub fn me_body(user_name: &str) -> Value {
    json!({
        "userId": "u-7",
        "email": "jaina@example.test",
        "userName": user_name,
        "isAdmin": true
    })
}
