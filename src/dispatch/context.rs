use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::access::AuthorizedUser;
use crate::dispatch::registry::ResolvedMethod;
use crate::error::DispatchError;

pub const DEFAULT_API_VERSION: &str = "v1";

fn default_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

/// Path-derived parameters naming the method to dispatch to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParams {
    #[serde(default = "default_version")]
    pub version: String,
    pub api_name: String,
    pub action: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Everything the transport hands over for one request
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub request_id: Uuid,
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub params: RouteParams,
    pub user: Option<AuthorizedUser>,
    pub body: Bytes,
}

/// Request metadata handed to a handler next to the caller's body.
///
/// Kept as its own struct rather than merged into the body, so no key a
/// client sends can shadow or forge any of these fields.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub params: RouteParams,
    pub user: Option<AuthorizedUser>,
    pub method_name: String,
    pub version: String,
}

impl RequestContext {
    /// Attach resolution results to the transport metadata
    pub fn enrich(request: InboundRequest, resolved: &ResolvedMethod) -> Self {
        Self {
            request_id: request.request_id,
            url: request.url,
            method: request.method,
            headers: request.headers,
            params: request.params,
            user: request.user,
            method_name: resolved.method_name.clone(),
            version: resolved.version.clone(),
        }
    }

    /// The authenticated user, or `Unauthorized` for anonymous callers
    pub fn require_user(&self) -> Result<&AuthorizedUser, DispatchError> {
        self.user.as_ref().ok_or(DispatchError::Unauthorized)
    }
}

/// Parse the caller body. An empty body is an empty object.
pub fn parse_body(bytes: &[u8]) -> Result<Value, DispatchError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_slice(bytes).map_err(|e| DispatchError::InvalidBody(e.to_string()))
}
