//! Session-aware request executor
//!
//! Single entry point for authenticated API calls. Attaches the bearer
//! credential, registers every call for bulk cancellation, classifies the
//! response body, and handles an expired credential with at most one
//! renewal and one retry before handing over to the invalidation cascade.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::errors::ApiError;
use super::invalidation::InvalidationCascade;
use super::registry::InFlightRegistry;
use super::renewal::RenewalCoordinator;
use crate::http::HttpClient;
use crate::session::CredentialStore;

/// Outgoing request body
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as JSON with `Content-Type: application/json`
    Json(Value),
    /// Sent as-is; set a content type through [`RequestOptions::header`]
    Text(String),
    /// Sent as-is; set a content type through [`RequestOptions::header`]
    Binary(Vec<u8>),
}

/// Response body, classified by the response content type
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
    /// Zero-length body (e.g. 204)
    Empty,
}

impl Payload {
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    method: Method,
    body: Option<RequestBody>,
    params: Vec<(String, Option<String>)>,
    headers: Vec<(String, String)>,
    cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self { method, ..Self::default() }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn json(self, value: Value) -> Self {
        self.body(RequestBody::Json(value))
    }

    /// Add a query parameter. `None` values are left out of the URL.
    #[must_use]
    pub fn param<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.params.push((key.into(), value.map(|v| v.to_string())));
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Let the caller abort the request.
    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }
}

/// Which send of a logical call this is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    /// After a successful renewal. Never renews again.
    Retry,
}

pub struct RequestExecutor {
    http: HttpClient,
    base_url: String,
    credentials: Arc<CredentialStore>,
    registry: InFlightRegistry,
    renewal: Arc<RenewalCoordinator>,
    cascade: Arc<InvalidationCascade>,
}

impl RequestExecutor {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        credentials: Arc<CredentialStore>,
        registry: InFlightRegistry,
        renewal: Arc<RenewalCoordinator>,
        cascade: Arc<InvalidationCascade>,
    ) -> Self {
        Self { http, base_url: base_url.into(), credentials, registry, renewal, cascade }
    }

    /// Perform one logical API call.
    ///
    /// # Errors
    /// - `ApiError::SessionExpired` once the session has been invalidated
    /// - `ApiError::Http` for any other non-2xx status
    /// - `ApiError::Cancelled` when aborted by the caller or by invalidation
    /// - `ApiError::Transport` for network failures
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn execute(&self, path: &str, options: RequestOptions) -> Result<Payload, ApiError> {
        let url = self.url(path, &options.params);

        let sent_with = self.credentials.access_token();
        match self.send_once(&url, &options, sent_with.as_deref(), Attempt::First).await {
            Err(err) if err.is_unauthorized() => {}
            other => return other,
        }

        // Another call may have rotated the credential while this one was in
        // flight; only renew when the rejected credential is still current.
        let current = self.credentials.access_token();
        let rotated = current.is_some() && current != sent_with;

        if !rotated && !self.await_renewal(&options).await? {
            debug!(path, "credential renewal unavailable");
            self.cascade.invalidate().await;
            return Err(ApiError::SessionExpired);
        }

        let renewed = self.credentials.access_token();
        match self.send_once(&url, &options, renewed.as_deref(), Attempt::Retry).await {
            Err(err) if err.is_unauthorized() => {
                warn!(path, "retry rejected after credential renewal");
                self.cascade.invalidate().await;
                Err(ApiError::SessionExpired)
            }
            other => other,
        }
    }

    /// Execute and deserialize a JSON response.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let value = match self.execute(path, options).await? {
            Payload::Json(value) => value,
            Payload::Empty => Value::Null,
            Payload::Text(text) => serde_json::from_str(&text)
                .map_err(|e| ApiError::Decode(format!("expected JSON body: {e}")))?,
            Payload::Binary(_) => {
                return Err(ApiError::Decode("expected JSON body, got binary".to_string()))
            }
        };

        serde_json::from_value(value)
            .map_err(|e| ApiError::Decode(format!("Failed to parse response: {e}")))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute_json(path, RequestOptions::get()).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute_json(path, RequestOptions::post().json(to_value(body)?)).await
    }

    pub async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute_json(path, RequestOptions::put().json(to_value(body)?)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Payload, ApiError> {
        self.execute(path, RequestOptions::delete()).await
    }

    pub fn registry(&self) -> &InFlightRegistry {
        &self.registry
    }

    fn url(&self, path: &str, params: &[(String, Option<String>)]) -> String {
        let mut url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let query = build_query(params);
        if !query.is_empty() {
            let separator = if url.contains('?') { '&' } else { '?' };
            url.push(separator);
            url.push_str(&query);
        }
        url
    }

    /// Wait for credential renewal, giving up when the caller cancels.
    async fn await_renewal(&self, options: &RequestOptions) -> Result<bool, ApiError> {
        let Some(cancel) = &options.cancel else {
            return Ok(self.renewal.ensure_fresh_credential().await);
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ApiError::Cancelled),
            renewed = self.renewal.ensure_fresh_credential() => Ok(renewed),
        }
    }

    async fn send_once(
        &self,
        url: &str,
        options: &RequestOptions,
        access_token: Option<&str>,
        attempt: Attempt,
    ) -> Result<Payload, ApiError> {
        let guard = self.registry.register(options.cancel.as_ref());
        let cancelled = guard.token().clone();

        let mut request = self.http.request(options.method.clone(), url);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(token) = access_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(body) = &options.body {
            if options.method != Method::GET && options.method != Method::HEAD {
                request = match body {
                    RequestBody::Json(value) => request.json(value),
                    RequestBody::Text(text) => request.body(text.clone()),
                    RequestBody::Binary(bytes) => request.body(bytes.clone()),
                };
            }
        }

        debug!(?attempt, url, "dispatching request");

        let outcome = tokio::select! {
            biased;
            () = cancelled.cancelled() => Err(ApiError::Cancelled),
            result = self.exchange(request) => result,
        };

        drop(guard);
        outcome
    }

    async fn exchange(&self, request: reqwest::RequestBuilder) -> Result<Payload, ApiError> {
        let response = self.http.send(request).await.map_err(ApiError::from)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_message(status, &bytes),
            });
        }

        classify(content_type.as_deref(), bytes.to_vec())
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("base_url", &self.base_url)
            .field("in_flight", &self.registry.len())
            .finish_non_exhaustive()
    }
}

fn to_value<B: Serialize>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Config(format!("Failed to serialize body: {e}")))
}

/// Percent-encoded query string, skipping `None` values.
fn build_query(params: &[(String, Option<String>)]) -> String {
    params
        .iter()
        .filter_map(|(key, value)| {
            value.as_ref().map(|value| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn classify(content_type: Option<&str>, bytes: Vec<u8>) -> Result<Payload, ApiError> {
    if bytes.is_empty() {
        return Ok(Payload::Empty);
    }

    let mime = content_type.and_then(|ct| ct.split(';').next()).map(str::trim).unwrap_or("");

    if mime == "application/json" || mime.ends_with("+json") {
        return serde_json::from_slice(&bytes)
            .map(Payload::Json)
            .map_err(|e| ApiError::Decode(format!("invalid JSON body: {e}")));
    }

    if mime == "application/octet-stream" || mime.starts_with("image/") {
        return Ok(Payload::Binary(bytes));
    }

    Ok(Payload::Text(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Best-effort human readable message for a failed response.
pub(crate) fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) {
        for key in ["message", "title", "error"] {
            if let Some(Value::String(message)) = fields.get(key) {
                if !message.trim().is_empty() {
                    return message.clone();
                }
            }
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    status.canonical_reason().unwrap_or("Request failed").to_string()
}
