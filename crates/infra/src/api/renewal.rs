//! Single-flight credential renewal
//!
//! However many requests hit a 401 at once, only one refresh exchange goes
//! out; everyone else awaits the same outcome. The exchange runs on its own
//! task so a caller dropping its future never abandons the renewal halfway.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use questline_domain::{RefreshRequest, TokenGrant};
use reqwest::Method;
use tracing::{debug, info, instrument, warn};

use crate::http::HttpClient;
use crate::session::CredentialStore;

type RenewalFuture = Shared<BoxFuture<'static, bool>>;

/// Generation-tagged in-progress renewal
type RenewalSlot = Arc<Mutex<Option<(u64, RenewalFuture)>>>;

pub struct RenewalCoordinator {
    http: HttpClient,
    refresh_url: String,
    device_name: Option<String>,
    credentials: Arc<CredentialStore>,
    in_progress: RenewalSlot,
    generation: AtomicU64,
    exchanges: Arc<AtomicU64>,
}

impl RenewalCoordinator {
    pub fn new(http: HttpClient, refresh_url: String, credentials: Arc<CredentialStore>) -> Self {
        Self {
            http,
            refresh_url,
            device_name: None,
            credentials,
            in_progress: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
            exchanges: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn with_device_name(mut self, device_name: Option<String>) -> Self {
        self.device_name = device_name;
        self
    }

    /// Make sure the store holds a usable access credential.
    ///
    /// Joins the renewal already in progress, or starts one. Returns `true`
    /// when new credentials were stored. Failures are logged and reported as
    /// `false`; they never propagate.
    #[instrument(skip(self))]
    pub async fn ensure_fresh_credential(&self) -> bool {
        let pending = {
            let mut slot = self.in_progress.lock();
            if let Some((_, existing)) = slot.as_ref() {
                debug!("joining in-progress credential renewal");
                existing.clone()
            } else {
                let Some(refresh_token) = self.credentials.refresh_token() else {
                    debug!("no renewal credential available");
                    return false;
                };
                let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                let pending = self.spawn_renewal(generation, refresh_token);
                *slot = Some((generation, pending.clone()));
                pending
            }
        };

        pending.await
    }

    /// Number of refresh exchanges started so far.
    pub fn exchanges(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }

    /// Whether a renewal is currently in progress.
    pub fn is_renewing(&self) -> bool {
        self.in_progress.lock().is_some()
    }

    fn spawn_renewal(&self, generation: u64, refresh_token: String) -> RenewalFuture {
        let http = self.http.clone();
        let url = self.refresh_url.clone();
        let body = RefreshRequest { refresh_token, device_name: self.device_name.clone() };
        let credentials = Arc::clone(&self.credentials);
        let slot = Arc::clone(&self.in_progress);
        let task_slot = Arc::clone(&self.in_progress);
        self.exchanges.fetch_add(1, Ordering::Relaxed);

        let handle = tokio::spawn(async move {
            let renewed = match exchange(&http, &url, &body).await {
                Some(grant) => credentials.apply_grant(grant).await,
                None => false,
            };
            // Release the marker before anyone can observe the outcome
            release(&task_slot, generation);
            renewed
        });

        async move {
            match handle.await {
                Ok(renewed) => renewed,
                Err(err) => {
                    warn!(error = %err, "credential renewal task failed");
                    release(&slot, generation);
                    false
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl std::fmt::Debug for RenewalCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenewalCoordinator")
            .field("refresh_url", &self.refresh_url)
            .field("renewing", &self.is_renewing())
            .finish_non_exhaustive()
    }
}

fn release(slot: &Mutex<Option<(u64, RenewalFuture)>>, generation: u64) {
    let mut slot = slot.lock();
    if matches!(slot.as_ref(), Some((current, _)) if *current == generation) {
        *slot = None;
    }
}

/// POST the renewal credential and parse the grant.
///
/// Goes through the raw client, never the executor, so a 401 here cannot
/// recurse into another renewal.
async fn exchange(http: &HttpClient, url: &str, body: &RefreshRequest) -> Option<TokenGrant> {
    let request = http.request(Method::POST, url).json(body);

    let response = match http.send(request).await {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "credential renewal request failed");
            return None;
        }
    };

    let status = response.status();
    if !status.is_success() {
        warn!(status = status.as_u16(), "credential renewal rejected");
        return None;
    }

    match response.json::<TokenGrant>().await {
        Ok(grant) if !grant.access_token.is_empty() => {
            info!(expires_at = %grant.access_token_expires_at, "credentials renewed");
            Some(grant)
        }
        Ok(_) => {
            warn!("credential renewal returned an empty access token");
            None
        }
        Err(err) => {
            warn!(error = %err, "credential renewal returned an unreadable body");
            None
        }
    }
}
