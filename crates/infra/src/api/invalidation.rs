//! Session invalidation cascade
//!
//! Runs when the session is proven unusable: aborts outstanding requests,
//! clears credentials and every session-scoped cache, then sends the
//! application to the unauthenticated entry route. A burst of failures
//! collapses into a single run.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use questline_core::{Navigator, SessionScopedCache};
use tracing::{debug, info, instrument};

use super::registry::InFlightRegistry;
use crate::session::CredentialStore;

pub struct InvalidationCascade {
    registry: InFlightRegistry,
    credentials: Arc<CredentialStore>,
    navigator: Arc<dyn Navigator>,
    caches: RwLock<Vec<Arc<dyn SessionScopedCache>>>,
    login_route: String,
    settle: Duration,
    handling: Arc<AtomicBool>,
    runs: AtomicU64,
}

impl InvalidationCascade {
    pub fn new(
        registry: InFlightRegistry,
        credentials: Arc<CredentialStore>,
        navigator: Arc<dyn Navigator>,
        login_route: impl Into<String>,
        settle: Duration,
    ) -> Self {
        Self {
            registry,
            credentials,
            navigator,
            caches: RwLock::new(Vec::new()),
            login_route: login_route.into(),
            settle,
            handling: Arc::new(AtomicBool::new(false)),
            runs: AtomicU64::new(0),
        }
    }

    /// Register state that must be dropped with the session.
    pub fn register_cache(&self, cache: Arc<dyn SessionScopedCache>) {
        debug!(cache = cache.name(), "registered session-scoped cache");
        self.caches.write().push(cache);
    }

    /// Tear the session down.
    ///
    /// Returns `false` without doing anything when another invalidation is
    /// still settling.
    #[instrument(skip(self))]
    pub async fn invalidate(&self) -> bool {
        if self
            .handling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("invalidation already in progress");
            return false;
        }
        self.runs.fetch_add(1, Ordering::Relaxed);

        let aborted = self.registry.abort_all();
        self.credentials.clear().await;

        let caches: Vec<_> = self.caches.read().clone();
        for cache in &caches {
            debug!(cache = cache.name(), "clearing session-scoped cache");
            cache.clear();
        }

        let current = self.navigator.current_route();
        let redirected = current != self.login_route;
        if redirected {
            self.navigator.navigate(&self.login_route);
        }

        info!(aborted, caches = caches.len(), redirected, "session invalidated");

        let handling = Arc::clone(&self.handling);
        let settle = self.settle;
        tokio::spawn(async move {
            tokio::time::sleep(settle).await;
            handling.store(false, Ordering::Release);
        });

        true
    }

    /// Whether a recent invalidation is still settling.
    pub fn is_handling(&self) -> bool {
        self.handling.load(Ordering::Acquire)
    }

    /// Number of times the cascade actually ran.
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for InvalidationCascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationCascade")
            .field("login_route", &self.login_route)
            .field("settle", &self.settle)
            .field("runs", &self.runs())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use parking_lot::Mutex;

    use super::*;
    use crate::session::MemorySnapshotStore;

    #[derive(Default)]
    struct RecordingNavigator {
        route: Mutex<String>,
        visits: Mutex<Vec<String>>,
    }

    impl RecordingNavigator {
        fn at(route: &str) -> Self {
            Self { route: Mutex::new(route.to_string()), visits: Mutex::default() }
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

    #[derive(Default)]
    struct CountingCache {
        clears: AtomicUsize,
    }

    impl SessionScopedCache for CountingCache {
        fn name(&self) -> &str {
            "counting"
        }

        fn clear(&self) {
            self.clears.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn cascade(
        navigator: Arc<RecordingNavigator>,
        settle: Duration,
    ) -> (InvalidationCascade, InFlightRegistry) {
        let registry = InFlightRegistry::new();
        let credentials = Arc::new(CredentialStore::new(Arc::new(MemorySnapshotStore::new())));
        let cascade =
            InvalidationCascade::new(registry.clone(), credentials, navigator, "/login", settle);
        (cascade, registry)
    }

    #[tokio::test]
    async fn burst_runs_once_and_redirects_once() {
        let navigator = Arc::new(RecordingNavigator::at("/dashboard"));
        let (cascade, _) = cascade(Arc::clone(&navigator), Duration::from_secs(60));
        let cache = Arc::new(CountingCache::default());
        cascade.register_cache(cache.clone());

        let results =
            futures::future::join_all((0..10).map(|_| cascade.invalidate())).await;

        assert_eq!(results.iter().filter(|ran| **ran).count(), 1);
        assert_eq!(cascade.runs(), 1);
        assert_eq!(navigator.visits.lock().as_slice(), ["/login".to_string()]);
        assert_eq!(cache.clears.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn aborts_in_flight_requests() {
        let navigator = Arc::new(RecordingNavigator::at("/dashboard"));
        let (cascade, registry) = cascade(navigator, Duration::from_millis(10));
        let guard = registry.register(None);

        assert!(cascade.invalidate().await);
        assert!(guard.token().is_cancelled());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn skips_redirect_when_already_on_login() {
        let navigator = Arc::new(RecordingNavigator::at("/login"));
        let (cascade, _) = cascade(Arc::clone(&navigator), Duration::from_millis(10));

        assert!(cascade.invalidate().await);
        assert!(navigator.visits.lock().is_empty());
    }

    #[tokio::test]
    async fn guard_releases_after_settle_delay() {
        let navigator = Arc::new(RecordingNavigator::at("/dashboard"));
        let (cascade, _) = cascade(navigator, Duration::from_millis(20));

        assert!(cascade.invalidate().await);
        assert!(cascade.is_handling());
        assert!(!cascade.invalidate().await);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!cascade.is_handling());
        assert!(cascade.invalidate().await);
        assert_eq!(cascade.runs(), 2);
    }
}
