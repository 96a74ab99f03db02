use clap::Subcommand;
use serde_json::Value;

use crate::cli::utils::{output_error, output_value};
use crate::cli::OutputFormat;

const DEFAULT_URL: &str = "http://127.0.0.1:3000";

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health status from the /health endpoint")]
    Health {
        #[arg(long, default_value = DEFAULT_URL, help = "Server base URL")]
        url: String,
    },

    #[command(about = "Show server information and registered methods from the root endpoint")]
    Info {
        #[arg(long, default_value = DEFAULT_URL, help = "Server base URL")]
        url: String,
    },

    #[command(about = "Call system.ping through the dispatch pipeline")]
    Ping {
        #[arg(long, default_value = DEFAULT_URL, help = "Server base URL")]
        url: String,
    },
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    let (url, request) = match cmd {
        ServerCommands::Health { url } => {
            let target = format!("{}/health", url.trim_end_matches('/'));
            (target.clone(), client.get(target))
        }
        ServerCommands::Info { url } => {
            let target = format!("{}/", url.trim_end_matches('/'));
            (target.clone(), client.get(target))
        }
        ServerCommands::Ping { url } => {
            let target = format!("{}/api/v1/system/ping", url.trim_end_matches('/'));
            (target.clone(), client.post(target))
        }
    };

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            output_error(&output_format, &format!("{} unreachable: {}", url, e))?;
            anyhow::bail!("server unreachable");
        }
    };

    let status = response.status();
    let version = response
        .headers()
        .get("x-version")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let body: Value = response.json().await?;

    output_value(
        &output_format,
        &body,
        &format!("{} {} ({})", url, status, version),
    )?;

    if !status.is_success() {
        anyhow::bail!("{} returned {}", url, status);
    }
    Ok(())
}
