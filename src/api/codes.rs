use serde::{Deserialize, Serialize};

/// Application-level result codes carried in every response envelope.
///
/// The serialized strings are part of the wire contract and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiCode {
    Success,
    Unknown,
    ApiNotFound,
    MethodNotFound,
    AccessDenied,
    Unauthorized,
    InvalidBody,
}

impl ApiCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiCode::Success => "SUCCESS",
            ApiCode::Unknown => "UNKNOWN",
            ApiCode::ApiNotFound => "API_NOT_FOUND",
            ApiCode::MethodNotFound => "METHOD_NOT_FOUND",
            ApiCode::AccessDenied => "ACCESS_DENIED",
            ApiCode::Unauthorized => "UNAUTHORIZED",
            ApiCode::InvalidBody => "INVALID_BODY",
        }
    }
}

impl std::fmt::Display for ApiCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
