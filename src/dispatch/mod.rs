// Dispatch pipeline: resolve -> authorize -> enrich -> invoke -> normalize -> send
//
// Every failure before sending is turned into an envelope exactly once, here.
// Nothing a handler does can escape to the transport.

pub mod context;
pub mod registry;
pub mod sender;

use axum::response::Response;
use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::Instrument;

use crate::access::{check_permissions, effective_level};
use crate::api::envelope::ResponseEnvelope;
use crate::api::reply::HandlerResult;
use crate::config::AppConfig;
use crate::error::DispatchError;

pub use context::{parse_body, InboundRequest, RequestContext, RouteParams, DEFAULT_API_VERSION};
pub use registry::{
    compose_method_name, wrap_method, ApiModule, ApiRegistry, Handler, HandlerDescriptor,
    MethodSummary, RegistryError, ResolvedMethod,
};
pub use sender::{ResponseSender, SendError};

/// Pipeline stage a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Resolving,
    Authorizing,
    Enriching,
    Invoking,
}

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ApiRegistry>,
    sender: ResponseSender,
    logger: tracing::Span,
}

impl Dispatcher {
    pub fn new(registry: Arc<ApiRegistry>, config: &AppConfig) -> Self {
        Self {
            registry,
            sender: ResponseSender::new(&config.package_description()),
            logger: config.logger("Controller"),
        }
    }

    pub fn registry(&self) -> &ApiRegistry {
        &self.registry
    }

    pub fn sender(&self) -> &ResponseSender {
        &self.sender
    }

    /// Run one request through the pipeline. Always yields a response.
    pub async fn dispatch(&self, request: InboundRequest) -> Response {
        let span = tracing::info_span!(
            parent: &self.logger,
            "dispatch",
            request_id = %request.request_id,
            url = %request.url
        );

        async move {
            tracing::info!("Get request for route {} {}", request.method, request.url);

            let outcome = self.execute(request).await;
            let envelope = ResponseEnvelope::from_outcome(outcome);
            self.send(&envelope)
        }
        .instrument(span)
        .await
    }

    /// Envelope an error raised outside the pipeline (e.g. by middleware)
    pub fn reject(&self, err: DispatchError) -> Response {
        let envelope = ResponseEnvelope::from_outcome(Err(err));
        self.send(&envelope)
    }

    fn send(&self, envelope: &ResponseEnvelope) -> Response {
        tracing::debug!("Sending {} with status {}", envelope.code, envelope.status_code);

        match self.sender.send(envelope) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = ?e, "Failed to send response: {}", e);
                self.sender.fallback()
            }
        }
    }

    async fn execute(&self, request: InboundRequest) -> HandlerResult {
        let resolved = self
            .registry
            .resolve(&request.params, &request.url)
            .map_err(|e| failed(DispatchStage::Resolving, e))?;

        // module level has priority: the stricter of the two applies
        let required = effective_level(resolved.api_access_level, resolved.access_level);

        tracing::debug!(
            "Params for route {} resolved to {}/{}.{} (requires {}), user {:?}",
            request.url,
            resolved.version,
            resolved.api_name,
            resolved.method_name,
            required,
            request.user.as_ref().map(|u| u.username.as_str())
        );

        check_permissions(request.user.as_ref(), required)
            .map_err(|e| failed(DispatchStage::Authorizing, e))?;

        let body = parse_body(&request.body).map_err(|e| failed(DispatchStage::Enriching, e))?;
        let ctx = RequestContext::enrich(request, &resolved);

        invoke(resolved.handler.as_ref(), ctx, body)
            .await
            .map_err(|e| failed(DispatchStage::Invoking, e))
    }
}

fn failed(stage: DispatchStage, err: DispatchError) -> DispatchError {
    tracing::debug!("Dispatch stopped while {:?}: {}", stage, err);
    err
}

/// Call the handler, containing panics as plain handler errors
async fn invoke(handler: &dyn Handler, ctx: RequestContext, body: Value) -> HandlerResult {
    match AssertUnwindSafe(handler.call(ctx, body)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            tracing::error!("Handler panicked: {}", message);

            Err(DispatchError::handler("Internal handler failure"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{AccessLevel, AuthorizedUser};
    use crate::api::reply::Reply;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method, StatusCode};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    async fn read_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    fn request(
        api: &str,
        action: &str,
        kind: Option<&str>,
        user: Option<AccessLevel>,
    ) -> InboundRequest {
        InboundRequest {
            request_id: Uuid::new_v4(),
            method: Method::POST,
            url: format!("/api/v1/{}/{}", api, action),
            headers: HeaderMap::new(),
            params: RouteParams {
                version: "v1".into(),
                api_name: api.into(),
                action: action.into(),
                kind: kind.map(str::to_string),
            },
            user: user.map(|access_level| AuthorizedUser {
                id: "k-1".into(),
                username: "willow".into(),
                access_level,
            }),
            body: Bytes::new(),
        }
    }

    fn dispatcher(counter: Arc<AtomicUsize>) -> Dispatcher {
        let calls = Arc::clone(&counter);
        let list_all = move |ctx: RequestContext, _body: Value| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, DispatchError>(Reply::ok(
                    json!({ "method": ctx.method_name, "version": ctx.version }),
                ))
            }
        };

        let mut registry = ApiRegistry::new();
        registry
            .register(
                "v1",
                ApiModule::new("forests")
                    .with_access_level(AccessLevel::Keeper)
                    .method("listAll", list_all)
                    .method("fail", |_ctx: RequestContext, _body: Value| async {
                        Err::<Reply, _>(DispatchError::handler("forest burned down"))
                    })
                    .method("panic", |_ctx: RequestContext, _body: Value| async {
                        if true {
                            panic!("axe slipped");
                        }
                        Ok::<_, DispatchError>(Reply::ok(Value::Null))
                    })
                    .method("echo", |ctx: RequestContext, body: Value| async move {
                        Ok::<_, DispatchError>(Reply::ok(
                            json!({ "body": body, "methodName": ctx.method_name }),
                        ))
                    }),
            )
            .unwrap();

        Dispatcher::new(Arc::new(registry), &AppConfig::development())
    }

    #[tokio::test]
    async fn keeper_reaches_keeper_module() {
        let counter = Arc::new(AtomicUsize::new(0));
        let response = dispatcher(Arc::clone(&counter))
            .dispatch(request("forests", "list", Some("all"), Some(AccessLevel::Keeper)))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        let body = read_json(response).await;
        assert_eq!(body["code"], "SUCCESS");
        assert_eq!(body["body"], json!({ "method": "listAll", "version": "v1" }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn anonymous_is_unauthorized_on_keeper_module() {
        let counter = Arc::new(AtomicUsize::new(0));
        let response = dispatcher(Arc::clone(&counter))
            .dispatch(request("forests", "list", Some("all"), None))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json(response).await["code"], "UNAUTHORIZED");
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_errors_are_normalized() {
        let response = dispatcher(Arc::new(AtomicUsize::new(0)))
            .dispatch(request("forests", "fail", None, Some(AccessLevel::Root)))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        assert_eq!(body, json!({ "code": "UNKNOWN", "body": "forest burned down" }));
    }

    #[tokio::test]
    async fn handler_panics_are_contained() {
        let response = dispatcher(Arc::new(AtomicUsize::new(0)))
            .dispatch(request("forests", "panic", None, Some(AccessLevel::Root)))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["cache-control"], "no-cache");
        let body = read_json(response).await;
        assert_eq!(body["code"], "UNKNOWN");
        assert_eq!(body["body"], "Internal handler failure");
    }

    #[tokio::test]
    async fn caller_body_cannot_forge_metadata() {
        let mut req = request("forests", "echo", None, Some(AccessLevel::Keeper));
        req.body = Bytes::from_static(
            br#"{"methodName":"dropDatabase","user":{"access_level":"system"}}"#,
        );

        let body = read_json(dispatcher(Arc::new(AtomicUsize::new(0))).dispatch(req).await).await;
        assert_eq!(body["body"]["methodName"], "echo");
        assert_eq!(body["body"]["body"]["methodName"], "dropDatabase");
        assert_eq!(body["body"]["body"]["user"]["access_level"], "system");
    }

    #[tokio::test]
    async fn invalid_body_is_rejected_after_authorization() {
        let mut req = request("forests", "echo", None, None);
        req.body = Bytes::from_static(b"{oops");
        let response = dispatcher(Arc::new(AtomicUsize::new(0))).dispatch(req).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut req = request("forests", "echo", None, Some(AccessLevel::Keeper));
        req.body = Bytes::from_static(b"{oops");
        let response = dispatcher(Arc::new(AtomicUsize::new(0))).dispatch(req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["code"], "INVALID_BODY");
    }

    #[tokio::test]
    async fn reject_envelopes_middleware_errors() {
        let response = dispatcher(Arc::new(AtomicUsize::new(0)))
            .reject(DispatchError::InvalidCredentials("expired".into()));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(read_json(response).await["code"], "UNAUTHORIZED");
    }
}
