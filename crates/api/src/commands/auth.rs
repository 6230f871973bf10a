//! Sign-in and sign-out commands

use std::time::Instant;

use questline_domain::{LoginRequest, SessionUser};
use crate::context::AppContext;
use crate::utils::logging::{api_error_label, log_command_execution};

// =============================================================================
// Session lifecycle
// =============================================================================

/// Sign in with email and password.
///
/// A rejected sign-in surfaces the server's message and leaves the current
/// session (if any) untouched.
pub async fn login(ctx: &AppContext, email: &str, password: &str) -> Result<SessionUser, String> {
    let start = Instant::now();
    let request = LoginRequest { email: email.trim().to_string(), password: password.to_string() };

    let result = ctx.auth.login(&request).await;

    let label = result.as_ref().err().map(api_error_label);
    log_command_execution("auth::login", start.elapsed(), label);

    result.map(|session| session.user).map_err(|e| e.to_string())
}

/// Sign out of this device. Always ends signed out.
pub async fn logout(ctx: &AppContext) {
    let start = Instant::now();
    ctx.auth.logout().await;
    log_command_execution("auth::logout", start.elapsed(), None);
}

/// Revoke every session of the signed-in user. Always ends signed out.
pub async fn logout_all(ctx: &AppContext) {
    let start = Instant::now();
    ctx.auth.logout_all().await;
    log_command_execution("auth::logout_all", start.elapsed(), None);
}

/// Principal of the live session, read from memory only.
pub fn current_user(ctx: &AppContext) -> Option<SessionUser> {
    ctx.credentials.user()
}

/// Re-validate the live session against the server.
///
/// Returns `None` (and ends signed out) when the server no longer accepts
/// the session.
pub async fn refresh_profile(ctx: &AppContext) -> Option<SessionUser> {
    let start = Instant::now();
    let user = ctx.auth.initiate().await;

    log_command_execution("auth::refresh_profile", start.elapsed(), user.is_none().then_some("auth"));
    user
}
