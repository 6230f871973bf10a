//! API-specific error types
//!
//! Classifies failures of the session-aware request pipeline.

use questline_domain::QuestlineError;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// The session is gone (expired credential, failed renewal)
    Authentication,
    /// Server errors (5xx)
    Server,
    /// Client errors (4xx except 401)
    Client,
    /// Network/connection errors
    Network,
    /// Request aborted by the caller or by session invalidation
    Cancelled,
    /// Misconfiguration or unusable response body
    Config,
}

/// Request pipeline errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Session expired")]
    SessionExpired,

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Transport(_) => ApiErrorCategory::Network,
            Self::Http { status: 401, .. } | Self::SessionExpired => {
                ApiErrorCategory::Authentication
            }
            Self::Http { status, .. } if *status >= 500 => ApiErrorCategory::Server,
            Self::Http { .. } => ApiErrorCategory::Client,
            Self::Cancelled => ApiErrorCategory::Cancelled,
            Self::Decode(_) | Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// Raw 401 from the server
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }

    /// Whether a view should render this error.
    ///
    /// Cancellations and expired sessions are already handled by the
    /// invalidation cascade's redirect.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::SessionExpired)
    }
}

impl From<QuestlineError> for ApiError {
    fn from(err: QuestlineError) -> Self {
        match err {
            QuestlineError::Config(msg) => Self::Config(msg),
            QuestlineError::InvalidInput(msg) => Self::Decode(msg),
            QuestlineError::Network(msg) => Self::Transport(msg),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<ApiError> for QuestlineError {
    fn from(err: ApiError) -> Self {
        match &err {
            ApiError::Transport(msg) => Self::Network(msg.clone()),
            ApiError::Http { status: 401 | 403, .. } | ApiError::SessionExpired => {
                Self::Auth(err.to_string())
            }
            ApiError::Http { status: 404, .. } => Self::NotFound(err.to_string()),
            ApiError::Http { status, .. } if *status < 500 => Self::InvalidInput(err.to_string()),
            ApiError::Http { .. } => Self::Network(err.to_string()),
            ApiError::Cancelled => Self::Internal(err.to_string()),
            ApiError::Decode(_) => Self::InvalidInput(err.to_string()),
            ApiError::Config(msg) => Self::Config(msg.clone()),
        }
    }
}
