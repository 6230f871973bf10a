//! Port interfaces for reset detection

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use questline_domain::{ResetKind, ResetResult, Result};

/// Calls the server-side trigger for a reset occurrence
#[async_trait]
pub trait ResetTrigger: Send + Sync {
    /// Ask the server to apply one occurrence of `kind`.
    async fn trigger(&self, kind: ResetKind) -> Result<ResetResult>;
}

/// Source of the current UTC time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
