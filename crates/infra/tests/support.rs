//! Shared fixtures for the session pipeline integration tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use questline_core::Navigator;
use questline_domain::{ApiRoutes, Session, SessionUser};
use questline_infra::api::{
    AuthService, InFlightRegistry, InvalidationCascade, RenewalCoordinator, RequestExecutor,
};
use questline_infra::http::HttpClient;
use questline_infra::session::{CredentialStore, MemorySnapshotStore};
use wiremock::MockServer;

pub const LOGIN_ROUTE: &str = "/login";

/// Navigator that records every redirect
pub struct RecordingNavigator {
    route: Mutex<String>,
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(route: &str) -> Self {
        Self { route: Mutex::new(route.to_string()), visits: Mutex::new(Vec::new()) }
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_route(&self) -> String {
        self.route.lock().clone()
    }

    fn navigate(&self, route: &str) {
        *self.route.lock() = route.to_string();
        self.visits.lock().push(route.to_string());
    }
}

/// Full request pipeline wired against a mock API server
pub struct Harness {
    pub server: MockServer,
    pub snapshots: Arc<MemorySnapshotStore>,
    pub credentials: Arc<CredentialStore>,
    pub registry: InFlightRegistry,
    pub renewal: Arc<RenewalCoordinator>,
    pub cascade: Arc<InvalidationCascade>,
    pub executor: Arc<RequestExecutor>,
    pub navigator: Arc<RecordingNavigator>,
    pub routes: ApiRoutes,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_settle(Duration::from_millis(500)).await
    }

    pub async fn with_settle(settle: Duration) -> Self {
        let server = MockServer::start().await;
        let routes = ApiRoutes::default();
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("http client");

        let snapshots = Arc::new(MemorySnapshotStore::new());
        let credentials = Arc::new(CredentialStore::new(snapshots.clone()));
        let registry = InFlightRegistry::new();
        let navigator = Arc::new(RecordingNavigator::at("/dashboard"));

        let renewal = Arc::new(RenewalCoordinator::new(
            http.clone(),
            format!("{}{}", server.uri(), routes.refresh),
            Arc::clone(&credentials),
        ));
        let cascade = Arc::new(InvalidationCascade::new(
            registry.clone(),
            Arc::clone(&credentials),
            navigator.clone(),
            LOGIN_ROUTE,
            settle,
        ));
        let executor = Arc::new(RequestExecutor::new(
            http,
            server.uri(),
            Arc::clone(&credentials),
            registry.clone(),
            Arc::clone(&renewal),
            Arc::clone(&cascade),
        ));

        Self {
            server,
            snapshots,
            credentials,
            registry,
            renewal,
            cascade,
            executor,
            navigator,
            routes,
        }
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            HttpClient::new().expect("http client"),
            self.server.uri(),
            self.routes.clone(),
            Arc::clone(&self.credentials),
            Arc::clone(&self.executor),
        )
    }

    pub async fn sign_in(&self, access: &str, refresh: &str) {
        self.credentials.replace(session(access, refresh)).await.expect("session accepted");
    }
}

pub fn session(access: &str, refresh: &str) -> Session {
    Session {
        user: SessionUser {
            user_id: "u-100".to_string(),
            email: "khadgar@example.test".to_string(),
            user_name: "Khadgar".to_string(),
            is_admin: true,
        },
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        access_token_expires_at: Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(),
    }
}

pub fn grant_body(access: &str, refresh: &str) -> serde_json::Value {
    serde_json::json!({
        "accessToken": access,
        "refreshToken": refresh,
        "accessTokenExpiresAt": "2026-06-01T13:00:00Z"
    })
}
