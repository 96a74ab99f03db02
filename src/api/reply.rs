use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::api::codes::ApiCode;
use crate::error::DispatchError;

/// Successful handler result, wrapped into the envelope by the normalizer
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub body: Value,
    pub status_code: Option<StatusCode>,
    pub code: Option<ApiCode>,
}

impl Reply {
    /// Create a successful reply with default 200 status
    pub fn ok(body: Value) -> Self {
        Self {
            body,
            status_code: None,
            code: None,
        }
    }

    /// Serialize any value into a 200 reply
    pub fn json<T: Serialize>(data: &T) -> Result<Self, DispatchError> {
        Ok(Self::ok(serde_json::to_value(data)?))
    }

    /// Create a reply with custom status code
    pub fn with_status(body: Value, status_code: StatusCode) -> Self {
        Self {
            body,
            status_code: Some(status_code),
            code: None,
        }
    }

    /// Create a 201 Created reply
    pub fn created(body: Value) -> Self {
        Self::with_status(body, StatusCode::CREATED)
    }

    /// Create a 202 Accepted reply
    pub fn accepted(body: Value) -> Self {
        Self::with_status(body, StatusCode::ACCEPTED)
    }

    /// Override the SUCCESS code in the envelope
    pub fn with_code(mut self, code: ApiCode) -> Self {
        self.code = Some(code);
        self
    }
}

impl From<Value> for Reply {
    fn from(body: Value) -> Self {
        Reply::ok(body)
    }
}

/// Outcome of a single handler invocation
pub type HandlerResult = Result<Reply, DispatchError>;
