//! Authentication service
//!
//! Sign-in goes straight through the raw HTTP client: there is no session to
//! renew yet, and a rejected password must not trigger the invalidation
//! cascade. Everything after sign-in goes through the executor.

use std::sync::Arc;

use questline_domain::{
    ApiRoutes, LoginRequest, LoginResponse, LogoutRequest, MeResponse, Session, SessionUser,
};
use reqwest::Method;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::errors::ApiError;
use super::executor::{error_message, RequestExecutor};
use crate::http::HttpClient;
use crate::session::CredentialStore;

pub struct AuthService {
    http: HttpClient,
    base_url: String,
    routes: ApiRoutes,
    credentials: Arc<CredentialStore>,
    executor: Arc<RequestExecutor>,
}

impl AuthService {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        routes: ApiRoutes,
        credentials: Arc<CredentialStore>,
        executor: Arc<RequestExecutor>,
    ) -> Self {
        Self { http, base_url: base_url.into(), routes, credentials, executor }
    }

    /// Sign in and make the returned session the live one.
    ///
    /// # Errors
    /// `ApiError::Http` carries the server's message (e.g. bad credentials).
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<Session, ApiError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), self.routes.login);
        let response = self
            .http
            .send(self.http.request(Method::POST, &url).json(request))
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to read login response: {e}")))?;

        if !status.is_success() {
            let message = error_message(status, &bytes);
            warn!(status = status.as_u16(), "sign-in rejected");
            return Err(ApiError::Http { status: status.as_u16(), message });
        }

        let session = serde_json::from_slice::<LoginResponse>(&bytes)
            .map_err(|e| ApiError::Decode(format!("Failed to parse login response: {e}")))?
            .into_session();

        self.credentials.replace(session.clone()).await.map_err(ApiError::from)?;
        info!(user_id = %session.user.user_id, "signed in");
        Ok(session)
    }

    /// Revoke the current refresh token and sign out locally.
    ///
    /// The local session is cleared even when the server call fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.credentials.refresh_token() {
            let body = LogoutRequest { refresh_token };
            let result =
                self.executor.post_json::<_, Option<Value>>(&self.routes.logout, &body).await;
            if let Err(err) = result {
                warn!(error = %err, "server-side logout failed");
            }
        }

        self.credentials.clear().await;
        info!("signed out");
    }

    /// Revoke every session of the current principal, then sign out locally.
    #[instrument(skip(self))]
    pub async fn logout_all(&self) {
        if self.credentials.is_authenticated() {
            let result = self
                .executor
                .post_json::<_, Option<Value>>(&self.routes.logout_all, &serde_json::json!({}))
                .await;
            if let Err(err) = result {
                warn!(error = %err, "server-side logout-all failed");
            }
        }

        self.credentials.clear().await;
        info!("signed out of all sessions");
    }

    pub async fn me(&self) -> Result<MeResponse, ApiError> {
        self.executor.get_json(&self.routes.me).await
    }

    /// Validate a restored session at startup.
    ///
    /// Without an access credential nothing is called. A successful `me`
    /// refreshes the stored principal; any failure signs out.
    #[instrument(skip(self))]
    pub async fn initiate(&self) -> Option<SessionUser> {
        self.credentials.access_token()?;

        match self.me().await {
            Ok(me) => {
                let user = SessionUser::from(me);
                self.credentials.update_user(user.clone()).await;
                info!(user_id = %user.user_id, "session validated");
                Some(user)
            }
            Err(err) => {
                warn!(error = %err, "restored session rejected; signing out");
                self.credentials.clear().await;
                None
            }
        }
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}
