// v1/tenures - privilege checks on a keeper's relationship to a forest

use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::access::{AccessLevel, TenurePrivilege};
use crate::api::codes::ApiCode;
use crate::api::reply::{HandlerResult, Reply};
use crate::dispatch::{ApiModule, RequestContext};
use crate::error::DispatchError;

pub fn module() -> ApiModule {
    ApiModule::new("tenures")
        .with_access_level(AccessLevel::Keeper)
        .method("checkPrivilege", check_privilege)
        .method("listPrivileges", list_privileges)
}

#[derive(Debug, Deserialize)]
struct PrivilegeCheck {
    privilege: String,
    required: String,
}

/// tenures.checkPrivilege - `{ privilege, required }` -> `{ allowed }`
pub async fn check_privilege(_ctx: RequestContext, body: Value) -> HandlerResult {
    let check: PrivilegeCheck = serde_json::from_value(body).map_err(|e| {
        DispatchError::detailed(
            StatusCode::BAD_REQUEST,
            ApiCode::InvalidBody,
            json!({ "message": "expected { privilege, required }", "reason": e.to_string() }),
        )
    })?;

    let held = parse_privilege("privilege", &check.privilege)?;
    let required = parse_privilege("required", &check.required)?;

    Ok(Reply::ok(json!({
        "privilege": held,
        "required": required,
        "allowed": held.permits(required),
    })))
}

/// tenures.listPrivileges - the tenure scale, lowest first
pub async fn list_privileges(_ctx: RequestContext, _body: Value) -> HandlerResult {
    let privileges: Vec<Value> = TenurePrivilege::ALL_PRIVILEGES
        .iter()
        .map(|p| json!({ "name": p.name(), "level": p.level() }))
        .collect();

    Ok(Reply::ok(Value::Array(privileges)))
}

fn parse_privilege(field: &str, value: &str) -> Result<TenurePrivilege, DispatchError> {
    value.parse().map_err(|reason: String| {
        DispatchError::detailed(
            StatusCode::BAD_REQUEST,
            ApiCode::InvalidBody,
            json!({ "field": field, "reason": reason }),
        )
    })
}
