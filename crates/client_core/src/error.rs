use shared::error::{ApiException, ErrorCode};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned status {status}")]
    Status { status: u16 },
    #[error("server rejected request: {0}")]
    Api(#[from] ApiException),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ServiceError {
    pub fn api(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Api(ApiException::new(code, message))
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Api(exception) => Some(exception.code),
            Self::Status { status } => Some(ErrorCode::from_http_status(*status)),
            Self::Transport(_) | Self::Decode(_) | Self::InvalidBaseUrl { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else if let Some(status) = value.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::Transport(value.to_string())
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
