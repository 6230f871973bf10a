//! Session and authentication wire types
//!
//! Field names follow the API's camelCase JSON. Timestamps serialize as
//! RFC 3339 strings so a persisted [`Session`] reloads losslessly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The signed-in principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: String,
    pub email: String,
    pub user_name: String,
    pub is_admin: bool,
}

/// The single live session: principal plus both credentials.
///
/// Only ever replaced or cleared as a whole by the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: SessionUser,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a session for `user` from a freshly issued token grant.
    #[must_use]
    pub fn from_grant(user: SessionUser, grant: TokenGrant) -> Self {
        Self {
            user,
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            access_token_expires_at: grant.access_token_expires_at,
        }
    }

    /// Whether the access token's advertised expiry is at or before `now`.
    #[must_use]
    pub fn is_access_expired(&self, now: DateTime<Utc>) -> bool {
        self.access_token_expires_at <= now
    }
}

/// Credentials posted to the login route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: String,
    pub email: String,
    pub user_name: String,
    pub is_admin: bool,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

impl LoginResponse {
    /// Split the login body into the session it establishes.
    #[must_use]
    pub fn into_session(self) -> Session {
        Session {
            user: SessionUser {
                user_id: self.user_id,
                email: self.email,
                user_name: self.user_name,
                is_admin: self.is_admin,
            },
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            access_token_expires_at: self.access_token_expires_at,
        }
    }
}

/// Body of the renewal exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
}

/// Credentials issued by the renewal exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

/// Body of the logout call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// Identity returned by the `me` route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: String,
    pub email: String,
    pub user_name: String,
    pub is_admin: bool,
}

impl From<MeResponse> for SessionUser {
    fn from(me: MeResponse) -> Self {
        Self { user_id: me.user_id, email: me.email, user_name: me.user_name, is_admin: me.is_admin }
    }
}
