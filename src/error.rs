// Dispatch error types
use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::api::codes::ApiCode;

/// Every failure the dispatch pipeline can turn into a response envelope.
///
/// Each variant knows its HTTP status and application code, so the normalizer
/// never has to guess. Business handlers use [`DispatchError::Handler`] through
/// the constructors below, or get it for free from `anyhow::Error`.
#[derive(Debug, Error)]
pub enum DispatchError {
    // 404 Not Found
    #[error("Undefined api: url: {url}")]
    ApiNotFound { url: String },

    #[error("Undefined api method: {method} from url: {url}")]
    MethodNotFound { method: String, url: String },

    // 401 Unauthorized
    #[error("You have no power. Authorize, please")]
    Unauthorized,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    // 403 Forbidden
    #[error("You have no power here")]
    Forbidden,

    // 400 Bad Request
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    // Raised by business logic; 500 / UNKNOWN unless attached explicitly
    #[error("{message}")]
    Handler {
        status: Option<StatusCode>,
        code: Option<ApiCode>,
        message: String,
        detail: Option<Value>,
    },
}

impl DispatchError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::ApiNotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::MethodNotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::Unauthorized => StatusCode::UNAUTHORIZED,
            DispatchError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            DispatchError::Forbidden => StatusCode::FORBIDDEN,
            DispatchError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            DispatchError::Handler { status, .. } => {
                status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Application code for this error
    pub fn api_code(&self) -> ApiCode {
        match self {
            DispatchError::ApiNotFound { .. } => ApiCode::ApiNotFound,
            DispatchError::MethodNotFound { .. } => ApiCode::MethodNotFound,
            DispatchError::Unauthorized => ApiCode::Unauthorized,
            DispatchError::InvalidCredentials(_) => ApiCode::Unauthorized,
            DispatchError::Forbidden => ApiCode::AccessDenied,
            DispatchError::InvalidBody(_) => ApiCode::InvalidBody,
            DispatchError::Handler { code, .. } => code.unwrap_or(ApiCode::Unknown),
        }
    }

    /// Client-facing body: structured detail when attached, else the message
    pub fn to_body(&self) -> Value {
        match self {
            DispatchError::Handler {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => Value::String(self.to_string()),
        }
    }
}

// Constructors for handler code
impl DispatchError {
    /// Plain business failure: 500 / UNKNOWN
    pub fn handler(message: impl Into<String>) -> Self {
        DispatchError::Handler {
            status: None,
            code: None,
            message: message.into(),
            detail: None,
        }
    }

    /// Business failure with an explicit status and application code
    pub fn respond(status: StatusCode, code: ApiCode, message: impl Into<String>) -> Self {
        DispatchError::Handler {
            status: Some(status),
            code: Some(code),
            message: message.into(),
            detail: None,
        }
    }

    /// Business failure whose envelope body is a structured JSON detail
    pub fn detailed(status: StatusCode, code: ApiCode, detail: Value) -> Self {
        DispatchError::Handler {
            status: Some(status),
            code: Some(code),
            message: detail.to_string(),
            detail: Some(detail),
        }
    }
}

impl From<anyhow::Error> for DispatchError {
    fn from(err: anyhow::Error) -> Self {
        DispatchError::handler(err.to_string())
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {}", err);
        DispatchError::handler("Failed to format response")
    }
}
