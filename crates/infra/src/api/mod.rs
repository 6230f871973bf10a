//! Session-aware API access
//!
//! - [`RequestExecutor`]: authenticated calls with renew-once-then-retry
//! - [`RenewalCoordinator`]: single-flight credential renewal
//! - [`InvalidationCascade`]: coordinated sign-out when the session dies
//! - [`InFlightRegistry`]: cancellation handles for outstanding calls
//! - [`AuthService`] / [`ResetService`]: endpoint wrappers

pub mod auth;
pub mod errors;
pub mod executor;
pub mod invalidation;
pub mod registry;
pub mod renewal;
pub mod resets;

pub use auth::AuthService;
pub use errors::{ApiError, ApiErrorCategory};
pub use executor::{Payload, RequestBody, RequestExecutor, RequestOptions};
pub use invalidation::InvalidationCascade;
pub use registry::{InFlightGuard, InFlightRegistry};
pub use renewal::RenewalCoordinator;
pub use resets::ResetService;
