//! In-process router state
//!
//! Holds the route the application currently shows and broadcasts every
//! change. Whatever renders the views subscribes and follows along.

use parking_lot::RwLock;
use questline_core::Navigator;
use tokio::sync::watch;
use tracing::info;

/// Route holder backing the [`Navigator`] port
#[derive(Debug)]
pub struct RouteNavigator {
    route: RwLock<String>,
    changes: watch::Sender<String>,
}

impl RouteNavigator {
    pub fn new(initial: impl Into<String>) -> Self {
        let initial = initial.into();
        let (changes, _) = watch::channel(initial.clone());
        Self { route: RwLock::new(initial), changes }
    }

    /// Receive every route the application moves to.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.changes.subscribe()
    }
}

impl Navigator for RouteNavigator {
    fn current_route(&self) -> String {
        self.route.read().clone()
    }

    fn navigate(&self, route: &str) {
        let previous = std::mem::replace(&mut *self.route.write(), route.to_string());
        if previous != route {
            info!(from = %previous, to = %route, "navigated");
        }
        self.changes.send_replace(route.to_string());
    }
}
