use chrono::Utc;
use clap::Args;
use serde_json::json;

use crate::cli::config::{self, CliConfig};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct InitArgs {
    #[arg(long, default_value = "http://127.0.0.1:3000", help = "Base URL of the API server")]
    pub api_url: String,

    #[arg(long, help = "Identity platform URL (defaults to the API URL)")]
    pub identity_url: Option<String>,

    #[arg(long, default_value = "", help = "Public API key of the identity platform")]
    pub anon_key: String,
}

pub async fn handle(args: InitArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    url::Url::parse(&args.api_url)?;
    if let Some(identity_url) = &args.identity_url {
        url::Url::parse(identity_url)?;
    }

    let cli_config = CliConfig {
        api_url: args.api_url.trim_end_matches('/').to_string(),
        identity_url: args.identity_url,
        anon_key: args.anon_key,
        updated_at: Utc::now(),
    };
    config::save_cli_config(&cli_config)?;
    // A session belongs to the server it was issued by
    config::clear_session()?;

    let config_dir = config::get_config_dir()?;
    output_success(
        &output_format,
        &format!("Configuration written to {}", config_dir.display()),
        Some(json!({
            "api_url": cli_config.api_url,
            "identity_url": cli_config.identity_url(),
        })),
    )
}
