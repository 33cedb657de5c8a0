use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    FailedPrecondition,
    RateLimited,
    Unavailable,
    Internal,
}

impl ErrorCode {
    pub fn from_status_code(code: i32) -> Self {
        match code {
            3 | 11 => Self::Validation,
            5 => Self::NotFound,
            7 => Self::Forbidden,
            8 => Self::RateLimited,
            9 => Self::FailedPrecondition,
            14 => Self::Unavailable,
            16 => Self::Unauthorized,
            _ => Self::Internal,
        }
    }

    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => Self::Validation,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 | 412 => Self::FailedPrecondition,
            429 => Self::RateLimited,
            502..=504 => Self::Unavailable,
            _ => Self::Internal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code:?}: {message}")]
pub struct ApiException {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<ApiError> for ApiException {
    fn from(value: ApiError) -> Self {
        Self {
            code: ErrorCode::from_status_code(value.code),
            message: value.message,
        }
    }
}
