use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::access::AuthorizedUser;
use crate::app::AppState;
use crate::auth::validate_jwt;
use crate::error::DispatchError;

/// Optional bearer authentication.
///
/// No Authorization header leaves the request anonymous; the dispatcher then
/// decides whether anonymous access is enough. A header that is present but
/// unusable is rejected here with an UNAUTHORIZED envelope.
pub async fn bearer_identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_jwt_from_headers(request.headers()) {
        Ok(Some(token)) => token,
        Ok(None) => return next.run(request).await,
        Err(msg) => {
            tracing::warn!("Rejected Authorization header: {}", msg);
            return state.dispatcher.reject(DispatchError::InvalidCredentials(msg));
        }
    };

    let claims = match validate_jwt(&token, &state.config.security) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("Rejected bearer token: {}", e);
            return state.dispatcher.reject(DispatchError::InvalidCredentials(e.to_string()));
        }
    };

    let user = AuthorizedUser::from(claims);
    tracing::debug!("Authenticated '{}' with {}", user.username, user.access_level);
    request.extensions_mut().insert(user);

    next.run(request).await
}

/// Extract JWT token from Authorization header, `None` when absent
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, String> {
    let auth_header = match headers.get(axum::http::header::AUTHORIZATION) {
        Some(value) => value,
        None => return Ok(None),
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(Some(token.trim().to_string()))
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
