//! Domain types and models

pub mod reset;
pub mod session;

pub use reset::{ResetKind, ResetResult, ResetStatus};
pub use session::{
    LoginRequest, LoginResponse, LogoutRequest, MeResponse, RefreshRequest, Session,
    SessionUser, TokenGrant,
};
