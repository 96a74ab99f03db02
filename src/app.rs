use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, State,
    },
    http::{HeaderMap, Method, Uri},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Extension, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::access::AuthorizedUser;
use crate::api::ApiCode;
use crate::config::AppConfig;
use crate::dispatch::{ApiRegistry, Dispatcher, InboundRequest, RouteParams};
use crate::error::DispatchError;
use crate::middleware::bearer_identity_middleware;

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: AppConfig, registry: ApiRegistry) -> Self {
        let dispatcher = Dispatcher::new(Arc::new(registry), &config);

        Self {
            config: Arc::new(config),
            dispatcher,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors_permissive = state.config.server.cors_permissive;

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Module dispatch
        .merge(api_routes(state.clone()))
        .fallback(unrouted)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/:version/:api_name/:action", any(route_handler))
        .route("/api/:version/:api_name/:action/:type", any(route_handler))
        .route_layer(middleware::from_fn_with_state(
            state,
            bearer_identity_middleware,
        ))
}

/// Transport adapter: collect request parts and hand them to the dispatcher
async fn route_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: Result<Path<RouteParams>, PathRejection>,
    user: Option<Extension<AuthorizedUser>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let Ok(Path(params)) = params else {
        return state.dispatcher.reject(DispatchError::ApiNotFound { url: uri.to_string() });
    };

    let body = match body {
        Ok(body) => body,
        Err(e) => {
            // keep the rejection's own status (413 for an oversized body)
            let err = DispatchError::respond(e.status(), ApiCode::InvalidBody, e.body_text());
            return state.dispatcher.reject(err);
        }
    };

    let request = InboundRequest {
        request_id: Uuid::new_v4(),
        method,
        url: uri.to_string(),
        headers,
        params,
        user: user.map(|Extension(user)| user),
        body,
    };

    state.dispatcher.dispatch(request).await
}

/// Anything outside the known route shapes, enveloped like a missing module
async fn unrouted(State(state): State<AppState>, uri: Uri) -> Response {
    state.dispatcher.reject(DispatchError::ApiNotFound {
        url: uri.to_string(),
    })
}

async fn root(State(state): State<AppState>) -> Response {
    let mut response = Json(json!({
        "name": state.config.package.name,
        "version": state.config.package.version,
        "description": "Seedler API - versioned module dispatch",
        "endpoints": {
            "health": "/health (public)",
            "api": "/api/:version/:api_name/:action[/:type] (access checked per method)",
        },
        "methods": state.dispatcher.registry().describe(),
    }))
    .into_response();

    state.dispatcher.sender().apply_control_headers(response.headers_mut());
    response
}

async fn health(State(state): State<AppState>) -> Response {
    let body: Value = json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "package": state.config.package_description(),
    });

    let mut response = Json(body).into_response();
    state.dispatcher.sender().apply_control_headers(response.headers_mut());
    response
}
