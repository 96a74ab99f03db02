use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use thiserror::Error;

use crate::api::envelope::ResponseEnvelope;

const FALLBACK_BODY: &str = r#"{"code":"UNKNOWN","body":"Failed to send response"}"#;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Failed to serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Writes envelopes to the transport with the fixed control headers
#[derive(Debug, Clone)]
pub struct ResponseSender {
    version_header: HeaderValue,
}

impl ResponseSender {
    /// `package_description` is the `name#version` sent as `X-Version`
    pub fn new(package_description: &str) -> Self {
        let version_header = HeaderValue::from_str(package_description).unwrap_or_else(|e| {
            tracing::error!("Invalid package description '{}': {}", package_description, e);
            HeaderValue::from_static(concat!(
                env!("CARGO_PKG_NAME"),
                "#",
                env!("CARGO_PKG_VERSION")
            ))
        });

        Self { version_header }
    }

    /// Version, nosniff, frame denial and no-cache, on every response
    pub fn apply_control_headers(&self, headers: &mut HeaderMap) {
        headers.insert(HeaderName::from_static("x-version"), self.version_header.clone());
        headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    }

    pub fn send(&self, envelope: &ResponseEnvelope) -> Result<Response, SendError> {
        let payload = serde_json::to_vec(envelope)?;
        let mut response = Response::new(Body::from(payload));

        if envelope.status_code != StatusCode::OK.as_u16() {
            match StatusCode::from_u16(envelope.status_code) {
                Ok(status) => *response.status_mut() = status,
                // response still goes out, with the default status
                Err(e) => tracing::error!(
                    "Failed to set response status {}: {}",
                    envelope.status_code,
                    e
                ),
            }
        }

        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.apply_control_headers(response.headers_mut());

        Ok(response)
    }

    /// Minimal 500 used when an envelope cannot be written
    pub fn fallback(&self) -> Response {
        let mut response = Response::new(Body::from(FALLBACK_BODY));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.apply_control_headers(response.headers_mut());
        response
    }
}
