//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use questline_domain::QuestlineError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub QuestlineError);

impl From<InfraError> for QuestlineError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<QuestlineError> for InfraError {
    fn from(value: QuestlineError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoQuestlineError {
    fn into_questline(self) -> QuestlineError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → QuestlineError */
/* -------------------------------------------------------------------------- */

impl IntoQuestlineError for HttpError {
    fn into_questline(self) -> QuestlineError {
        if self.is_builder() {
            return QuestlineError::Config(format!("invalid HTTP request: {self}"));
        }

        if self.is_timeout() {
            return QuestlineError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return QuestlineError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return QuestlineError::InvalidInput(format!("failed to decode HTTP body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => QuestlineError::Auth(message),
                404 => QuestlineError::NotFound(message),
                400..=499 => QuestlineError::InvalidInput(message),
                _ => QuestlineError::Network(message),
            };
        }

        QuestlineError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_questline())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → QuestlineError */
/* -------------------------------------------------------------------------- */

impl IntoQuestlineError for IoError {
    fn into_questline(self) -> QuestlineError {
        match self.kind() {
            ErrorKind::NotFound => QuestlineError::NotFound(format!("file not found: {self}")),
            ErrorKind::PermissionDenied => {
                QuestlineError::Storage(format!("permission denied: {self}"))
            }
            _ => QuestlineError::Storage(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_questline())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → QuestlineError */
/* -------------------------------------------------------------------------- */

impl IntoQuestlineError for JsonError {
    fn into_questline(self) -> QuestlineError {
        if self.is_io() {
            QuestlineError::Storage(format!("JSON I/O failure: {self}"))
        } else {
            QuestlineError::InvalidInput(format!("malformed JSON: {self}"))
        }
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_questline())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
