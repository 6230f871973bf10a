//! Credential store
//!
//! Holds the single live [`Session`] in memory and mirrors it to a
//! [`SessionSnapshotStore`]. Memory is authoritative: snapshot failures are
//! logged and never fail the in-memory operation.
//!
//! Every mutation replaces the whole `Option<Session>` under one write lock,
//! so readers never observe a principal paired with another session's
//! credentials.

use std::sync::Arc;

use parking_lot::RwLock;
use questline_core::SessionSnapshotStore;
use questline_domain::{QuestlineError, Result, Session, SessionUser, TokenGrant};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

pub struct CredentialStore {
    session: RwLock<Option<Session>>,
    snapshots: Arc<dyn SessionSnapshotStore>,
    /// Serializes snapshot writes so the persisted state converges on memory
    persist_lock: AsyncMutex<()>,
}

impl CredentialStore {
    pub fn new(snapshots: Arc<dyn SessionSnapshotStore>) -> Self {
        Self { session: RwLock::new(None), snapshots, persist_lock: AsyncMutex::new(()) }
    }

    /// Load the persisted snapshot into memory.
    ///
    /// A snapshot that cannot be parsed is treated as "no session" and
    /// erased. Any other load failure starts signed out but leaves the
    /// snapshot in place. Returns whether a session was restored.
    pub async fn restore(&self) -> bool {
        let loaded = match self.snapshots.load().await {
            Ok(loaded) => loaded.filter(|session| !session.access_token.is_empty()),
            Err(err @ QuestlineError::InvalidInput(_)) => {
                warn!(error = %err, "discarding unreadable session snapshot");
                if let Err(err) = self.snapshots.erase().await {
                    warn!(error = %err, "failed to erase unreadable session snapshot");
                }
                None
            }
            Err(err) => {
                warn!(error = %err, "session snapshot unavailable; keeping it for next start");
                None
            }
        };

        let restored = loaded.is_some();
        *self.session.write() = loaded;

        if restored {
            info!("session restored from snapshot");
        } else {
            debug!("no session snapshot to restore");
        }
        restored
    }

    /// Copy of the live session.
    pub fn current(&self) -> Option<Session> {
        self.session.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.session
            .read()
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .filter(|token| !token.is_empty())
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.session.read().as_ref().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_some()
    }

    /// Overwrite the live session.
    ///
    /// # Errors
    /// Returns `QuestlineError::InvalidInput` when the access token is empty.
    pub async fn replace(&self, session: Session) -> Result<()> {
        if session.access_token.is_empty() {
            return Err(QuestlineError::InvalidInput("session has no access token".to_string()));
        }

        debug!(user_id = %session.user.user_id, "replacing session");
        *self.session.write() = Some(session);
        self.persist().await;
        Ok(())
    }

    /// Swap in freshly issued credentials, keeping the principal.
    ///
    /// Returns `false` and changes nothing when the session was cleared in
    /// the meantime.
    pub async fn apply_grant(&self, grant: TokenGrant) -> bool {
        {
            let mut guard = self.session.write();
            let Some(current) = guard.as_ref() else {
                debug!("session cleared before renewal completed; dropping grant");
                return false;
            };
            *guard = Some(Session::from_grant(current.user.clone(), grant));
        }

        self.persist().await;
        true
    }

    /// Replace the principal of the live session. No-op when signed out.
    pub async fn update_user(&self, user: SessionUser) -> bool {
        {
            let mut guard = self.session.write();
            let Some(current) = guard.as_ref() else {
                return false;
            };
            *guard = Some(Session { user, ..current.clone() });
        }

        self.persist().await;
        true
    }

    /// Drop the principal and both credentials, then erase the snapshot.
    pub async fn clear(&self) {
        let previous = self.session.write().take();
        if previous.is_some() {
            info!("session cleared");
        }
        self.persist().await;
    }

    /// Mirror whatever memory holds right now to the snapshot.
    async fn persist(&self) {
        let _persist = self.persist_lock.lock().await;
        let current = self.current();

        let result = match &current {
            Some(session) => self.snapshots.save(session).await,
            None => self.snapshots.erase().await,
        };

        if let Err(err) = result {
            warn!(error = %err, "failed to persist session snapshot");
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
