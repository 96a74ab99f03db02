// v1/system - public service methods, open to anonymous callers

use serde_json::{json, Value};

use crate::api::reply::{HandlerResult, Reply};
use crate::dispatch::{ApiModule, RequestContext};

pub fn module() -> ApiModule {
    ApiModule::new("system")
        .method("ping", ping)
        .method("getInfo", get_info)
        .method("echo", echo)
}

/// system.ping - liveness through the full dispatch pipeline
pub async fn ping(_ctx: RequestContext, _body: Value) -> HandlerResult {
    Ok(Reply::ok(json!({ "pong": true })))
}

/// system.getInfo - what the dispatcher resolved for this request
pub async fn get_info(ctx: RequestContext, _body: Value) -> HandlerResult {
    Ok(Reply::ok(json!({
        "requestId": ctx.request_id,
        "version": ctx.version,
        "method": ctx.method_name,
        "httpMethod": ctx.method.as_str(),
        "url": ctx.url,
        "authenticated": ctx.user.is_some(),
    })))
}

/// system.echo - returns the caller body untouched next to the resolved method
pub async fn echo(ctx: RequestContext, body: Value) -> HandlerResult {
    Ok(Reply::ok(json!({
        "method": ctx.method_name,
        "body": body,
    })))
}
