//! Port interfaces for session persistence and teardown

use async_trait::async_trait;
use questline_domain::{Result, Session};

/// Persisted snapshot of the live session
///
/// Exactly one snapshot exists per namespaced key. Implementations must
/// report unreadable or corrupt content as an error rather than a partial
/// session; callers treat any error as "no session".
#[async_trait]
pub trait SessionSnapshotStore: Send + Sync {
    /// Load the stored snapshot, `Ok(None)` when nothing is stored.
    async fn load(&self) -> Result<Option<Session>>;

    /// Overwrite the stored snapshot.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Remove the stored snapshot (idempotent).
    async fn erase(&self) -> Result<()>;
}

/// Application navigation, abstracted from any concrete router
pub trait Navigator: Send + Sync {
    /// Route the application currently shows.
    fn current_route(&self) -> String;

    /// Move the application to `route`.
    fn navigate(&self, route: &str);
}

/// Process-wide state whose validity depends on the signed-in session
pub trait SessionScopedCache: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &str;

    /// Drop everything cached for the current session.
    fn clear(&self);
}
