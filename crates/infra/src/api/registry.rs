//! In-flight request registry
//!
//! Every executor request registers a cancellation handle here for the
//! lifetime of the call. Session invalidation aborts them all at once.

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// Shared set of cancellation handles for outstanding requests
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    handles: Arc<DashMap<Uuid, CancellationToken>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new in-flight request.
    ///
    /// With a caller token the registered handle is its child, so cancelling
    /// either the caller's token or the registry aborts the request.
    pub fn register(&self, parent: Option<&CancellationToken>) -> InFlightGuard {
        let token = parent.map_or_else(CancellationToken::new, CancellationToken::child_token);
        let id = Uuid::new_v4();
        self.handles.insert(id, token.clone());
        InFlightGuard { id, token, handles: Arc::clone(&self.handles) }
    }

    /// Cancel every registered request and empty the registry.
    pub fn abort_all(&self) -> usize {
        let ids: Vec<Uuid> = self.handles.iter().map(|entry| *entry.key()).collect();
        let mut aborted = 0;
        for id in ids {
            if let Some((_, token)) = self.handles.remove(&id) {
                token.cancel();
                aborted += 1;
            }
        }
        debug!(aborted, "aborted in-flight requests");
        aborted
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Registration of one request; dropping it deregisters.
#[derive(Debug)]
pub struct InFlightGuard {
    id: Uuid,
    token: CancellationToken,
    handles: Arc<DashMap<Uuid, CancellationToken>>,
}

impl InFlightGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.handles.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_drop_deregisters() {
        let registry = InFlightRegistry::new();
        let guard = registry.register(None);
        assert_eq!(registry.len(), 1);

        drop(guard);
        assert!(registry.is_empty());
    }

    #[test]
    fn abort_all_cancels_and_empties() {
        let registry = InFlightRegistry::new();
        let first = registry.register(None);
        let second = registry.register(None);

        assert_eq!(registry.abort_all(), 2);
        assert!(registry.is_empty());
        assert!(first.token().is_cancelled());
        assert!(second.token().is_cancelled());
    }

    #[test]
    fn caller_token_cancels_registered_handle() {
        let registry = InFlightRegistry::new();
        let caller = CancellationToken::new();
        let guard = registry.register(Some(&caller));

        caller.cancel();
        assert!(guard.token().is_cancelled());
    }

    #[test]
    fn abort_does_not_cancel_caller_token() {
        let registry = InFlightRegistry::new();
        let caller = CancellationToken::new();
        let _guard = registry.register(Some(&caller));

        registry.abort_all();
        assert!(!caller.is_cancelled());
    }
}
