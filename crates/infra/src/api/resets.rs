//! Reset trigger endpoints

use std::sync::Arc;

use async_trait::async_trait;
use questline_core::ResetTrigger;
use questline_domain::{ApiRoutes, QuestlineError, ResetKind, ResetResult, Result};
use tracing::{debug, info, instrument};

use super::executor::{Payload, RequestExecutor, RequestOptions};

/// Calls the server-side daily/weekly reset triggers through the executor
#[derive(Debug)]
pub struct ResetService {
    executor: Arc<RequestExecutor>,
    routes: ApiRoutes,
}

impl ResetService {
    pub fn new(executor: Arc<RequestExecutor>, routes: ApiRoutes) -> Self {
        Self { executor, routes }
    }

    fn route(&self, kind: ResetKind) -> &str {
        match kind {
            ResetKind::Daily => &self.routes.daily_reset,
            ResetKind::Weekly => &self.routes.weekly_reset,
        }
    }
}

#[async_trait]
impl ResetTrigger for ResetService {
    #[instrument(skip(self))]
    async fn trigger(&self, kind: ResetKind) -> Result<ResetResult> {
        let payload = self
            .executor
            .execute(self.route(kind), RequestOptions::post())
            .await
            .map_err(QuestlineError::from)?;

        // Any 2xx applies the reset; the body only adds detail
        let result = match payload {
            Payload::Json(value) => serde_json::from_value(value).unwrap_or_else(|err| {
                debug!(%kind, error = %err, "unrecognised reset response body");
                ResetResult::default()
            }),
            Payload::Text(_) | Payload::Binary(_) | Payload::Empty => ResetResult::default(),
        };

        info!(%kind, affected = result.affected, "reset triggered");
        Ok(result)
    }
}
