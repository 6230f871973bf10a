//! # Questline Infrastructure
//!
//! Adapters that implement the `questline-core` ports and the session-aware
//! request pipeline.
//!
//! This crate contains:
//! - HTTP client wrapper over `reqwest`
//! - Credential store and session snapshot persistence
//! - Request executor with single-flight credential renewal
//! - Session invalidation cascade
//! - Auth and reset API services
//! - Periodic reset scheduler
//! - Configuration loading
//! - Error conversions into `QuestlineError`

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod scheduling;
pub mod session;

pub use api::{
    ApiError, ApiErrorCategory, AuthService, InFlightRegistry, InvalidationCascade, Payload,
    RenewalCoordinator, RequestBody, RequestExecutor, RequestOptions, ResetService,
};
pub use config::load as load_config;
pub use errors::InfraError;
pub use http::HttpClient;
pub use scheduling::{ResetScheduler, SchedulerError, SchedulerResult};
pub use session::{CredentialStore, FileSnapshotStore, MemorySnapshotStore};
