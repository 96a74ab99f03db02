use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::api::codes::ApiCode;
use crate::api::reply::HandlerResult;

/// Uniform response shape: `{ "code", "body" }` plus the HTTP status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub code: ApiCode,
    pub body: Value,
    #[serde(skip)]
    pub status_code: u16,
}

impl ResponseEnvelope {
    /// Normalize a handler outcome. Never fails: this is the last stop
    /// before the transport, so every error becomes a well-formed envelope.
    pub fn from_outcome(outcome: HandlerResult) -> Self {
        match outcome {
            Ok(reply) => Self {
                code: reply.code.unwrap_or(ApiCode::Success),
                body: reply.body,
                status_code: reply.status_code.unwrap_or(StatusCode::OK).as_u16(),
            },
            Err(err) => {
                tracing::error!(error = ?err, "Request failed: {}", err);

                Self {
                    code: err.api_code(),
                    body: err.to_body(),
                    status_code: err.status_code().as_u16(),
                }
            }
        }
    }
}
