//! Application context - dependency injection container

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use questline_core::{
    Clock, Navigator, ResetSchedule, ResetTrigger, SessionSnapshotStore, SystemClock,
};
use questline_domain::{Config, QuestlineError, Result, SessionUser};
use questline_infra::scheduling::ResetSchedulerConfig;
use questline_infra::{
    config, AuthService, CredentialStore, FileSnapshotStore, HttpClient, InFlightRegistry,
    InvalidationCascade, RenewalCoordinator, RequestExecutor, ResetScheduler, ResetService,
    SchedulerError,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::navigation::RouteNavigator;

/// Route the application shows before anything else navigates
const INITIAL_ROUTE: &str = "/";

/// Every service the commands need, wired once at startup
pub struct AppContext {
    pub config: Config,
    pub credentials: Arc<CredentialStore>,
    pub registry: InFlightRegistry,
    pub navigator: Arc<RouteNavigator>,
    pub cascade: Arc<InvalidationCascade>,
    pub renewal: Arc<RenewalCoordinator>,
    pub executor: Arc<RequestExecutor>,
    pub auth: Arc<AuthService>,
    pub resets: Arc<ResetService>,
    pub scheduler: Mutex<ResetScheduler>,
}

impl AppContext {
    /// Build the context with the session snapshot stored on disk.
    ///
    /// # Errors
    /// Returns `QuestlineError::Config` when the configuration is invalid or
    /// the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let dir = PathBuf::from(&config.session.snapshot_dir);
        let snapshots = Arc::new(FileSnapshotStore::new(dir, &config.session.snapshot_key));
        Self::with_parts(config, snapshots, Arc::new(SystemClock))
    }

    /// Build the context around caller-supplied persistence and time.
    ///
    /// # Errors
    /// Same as [`AppContext::new`].
    pub fn with_parts(
        config: Config,
        snapshots: Arc<dyn SessionSnapshotStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config::validate(&config)?;

        let http = build_http_client(&config)?;
        let base_url = config.api.base_url.trim_end_matches('/').to_string();
        let routes = config.api.routes.clone();

        let credentials = Arc::new(CredentialStore::new(snapshots));
        let registry = InFlightRegistry::new();
        let navigator = Arc::new(RouteNavigator::new(INITIAL_ROUTE));

        let renewal = Arc::new(
            RenewalCoordinator::new(
                http.clone(),
                format!("{base_url}{}", routes.refresh),
                Arc::clone(&credentials),
            )
            .with_device_name(config.api.device_name.clone()),
        );

        let cascade = Arc::new(InvalidationCascade::new(
            registry.clone(),
            Arc::clone(&credentials),
            Arc::clone(&navigator) as Arc<dyn Navigator>,
            config.session.login_route.clone(),
            Duration::from_millis(config.session.invalidation_settle_ms),
        ));

        let executor = Arc::new(RequestExecutor::new(
            http.clone(),
            base_url.clone(),
            Arc::clone(&credentials),
            registry.clone(),
            Arc::clone(&renewal),
            Arc::clone(&cascade),
        ));

        let auth = Arc::new(AuthService::new(
            http,
            base_url,
            routes.clone(),
            Arc::clone(&credentials),
            Arc::clone(&executor),
        ));

        let resets = Arc::new(ResetService::new(Arc::clone(&executor), routes));
        let schedule = ResetSchedule::from_config(&config.resets)?;
        let scheduler = ResetScheduler::new(
            schedule,
            Arc::clone(&resets) as Arc<dyn ResetTrigger>,
            clock,
            ResetSchedulerConfig::from(&config.resets),
        );

        Ok(Self {
            config,
            credentials,
            registry,
            navigator,
            cascade,
            renewal,
            executor,
            auth,
            resets,
            scheduler: Mutex::new(scheduler),
        })
    }

    /// Restore the persisted session and confirm it with the server.
    ///
    /// Returns the signed-in principal, `None` when the application starts
    /// signed out.
    pub async fn initialize(&self) -> Option<SessionUser> {
        if !self.credentials.restore().await {
            info!("no persisted session; starting signed out");
            return None;
        }
        self.auth.initiate().await
    }

    /// Start the reset scheduler.
    ///
    /// # Errors
    /// Returns an error if the scheduler is already running.
    pub async fn start(&self) -> Result<()> {
        self.scheduler.lock().await.start().await?;
        Ok(())
    }

    /// Stop background work and abort requests still in flight.
    ///
    /// # Errors
    /// Returns an error if the scheduler task does not stop in time.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutdown called on AppContext");

        match self.scheduler.lock().await.stop().await {
            Ok(()) | Err(SchedulerError::NotRunning) => {}
            Err(err) => return Err(QuestlineError::from(err)),
        }

        let aborted = self.registry.abort_all();
        if aborted > 0 {
            warn!(aborted, "aborted in-flight requests during shutdown");
        }

        Ok(())
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("base_url", &self.config.api.base_url)
            .field("authenticated", &self.credentials.is_authenticated())
            .field("in_flight", &self.registry.len())
            .finish_non_exhaustive()
    }
}

fn build_http_client(config: &Config) -> Result<HttpClient> {
    let mut builder = HttpClient::builder().connect_timeout(Duration::from_secs(10));
    if let Some(secs) = config.api.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let agent = config
        .api
        .user_agent
        .clone()
        .unwrap_or_else(|| format!("questline/{}", env!("CARGO_PKG_VERSION")));
    builder.user_agent(agent).build()
}
