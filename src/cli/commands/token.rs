use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::access::AccessLevel;
use crate::auth::{generate_jwt, Claims};
use crate::cli::{utils::output_value, OutputFormat};
use crate::config::AppConfig;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(help = "Keeper username")]
    pub username: String,

    #[arg(
        long,
        default_value = "keeper",
        help = "Access level name or number (all, keeper, support, root, system)"
    )]
    pub level: String,

    #[arg(long, help = "Keeper id (defaults to the username)")]
    pub id: Option<String>,

    #[arg(long, help = "Token lifetime in hours (defaults to JWT_EXPIRY_HOURS)")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    let level: AccessLevel = args.level.parse().map_err(anyhow::Error::msg)?;
    let hours = args.hours.unwrap_or(config.security.jwt_expiry_hours);
    let id = args.id.unwrap_or_else(|| args.username.clone());

    let claims = Claims::new(id, args.username, level, hours);
    let token = generate_jwt(&claims, &config.security).context("failed to issue token")?;

    output_value(&output_format, &json!({ "token": token, "claims": claims }), &token)
}
