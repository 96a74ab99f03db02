// v1/keepers - account methods; every method needs at least a keeper account

use serde::Serialize;
use serde_json::{json, Value};

use crate::access::AccessLevel;
use crate::api::reply::{HandlerResult, Reply};
use crate::dispatch::{ApiModule, RequestContext};

pub fn module() -> ApiModule {
    ApiModule::new("keepers")
        .with_access_level(AccessLevel::Keeper)
        .method("whoami", whoami)
        .method("listLevels", list_levels)
        .restricted_method("getSupport", AccessLevel::Support, get_support)
}

#[derive(Debug, Serialize)]
struct LevelInfo {
    name: &'static str,
    level: u8,
}

/// keepers.whoami
pub async fn whoami(ctx: RequestContext, _body: Value) -> HandlerResult {
    let user = ctx.require_user()?;
    Reply::json(user)
}

/// keepers.listLevels - the account tiers, lowest first
pub async fn list_levels(_ctx: RequestContext, _body: Value) -> HandlerResult {
    let levels: Vec<LevelInfo> = AccessLevel::ALL_LEVELS
        .iter()
        .map(|level| LevelInfo {
            name: level.name(),
            level: level.level(),
        })
        .collect();

    Reply::json(&levels)
}

/// keepers.getSupport - support desk entry point
pub async fn get_support(ctx: RequestContext, _body: Value) -> HandlerResult {
    let user = ctx.require_user()?;

    Ok(Reply::ok(json!({
        "agent": user.username,
        "level": user.access_level,
    })))
}
