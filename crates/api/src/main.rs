//! Questline - session-aware API client
//!
//! Restores the persisted session, keeps the reset countdowns ticking and
//! logs every refetch signal until interrupted.

use anyhow::Context;
use questline_domain::Config;
use questline_lib::utils::logging::init_tracing;
use questline_lib::{login, AppContext};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the subscriber reads RUST_LOG
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env file loaded"),
    }

    let config = match questline_infra::load_config() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "no usable configuration found; using defaults");
            Config::default()
        }
    };
    info!(base_url = %config.api.base_url, "Questline starting");

    let ctx = AppContext::new(config).context("failed to build application context")?;

    match ctx.initialize().await {
        Some(user) => info!(user = %user.user_name, "session restored"),
        None => sign_in_from_env(&ctx).await,
    }

    ctx.start().await.context("failed to start reset scheduler")?;

    let mut status = ctx.scheduler.lock().await.subscribe();
    let mut routes = ctx.navigator.subscribe();
    let mut last_token = status.borrow().refetch_token;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                if current.refetch_token != last_token {
                    last_token = current.refetch_token;
                    info!(
                        refetch_token = current.refetch_token,
                        daily = %current.daily,
                        weekly = %current.weekly,
                        "reset observed; views should refetch"
                    );
                }
            }
            changed = routes.changed() => {
                if changed.is_err() {
                    break;
                }
                let route = routes.borrow_and_update().clone();
                info!(%route, "route changed");
            }
        }
    }

    ctx.shutdown().await.context("shutdown failed")?;
    info!("Questline stopped");
    Ok(())
}

/// Sign in with `QUESTLINE_LOGIN_EMAIL`/`QUESTLINE_LOGIN_PASSWORD` when both
/// are set.
async fn sign_in_from_env(ctx: &AppContext) {
    let (Ok(email), Ok(password)) =
        (std::env::var("QUESTLINE_LOGIN_EMAIL"), std::env::var("QUESTLINE_LOGIN_PASSWORD"))
    else {
        info!("starting signed out");
        return;
    };

    match login(ctx, &email, &password).await {
        Ok(user) => info!(user = %user.user_name, "signed in"),
        Err(e) => warn!(error = %e, "sign-in failed; starting signed out"),
    }
}
