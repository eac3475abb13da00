use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::identity::Principal;

/// Where the CLI talks to: the API (gateway and REST) and the identity platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub api_url: String,
    /// Defaults to `api_url` when the server answers the identity API itself
    #[serde(default)]
    pub identity_url: Option<String>,
    #[serde(default)]
    pub anon_key: String,
    pub updated_at: DateTime<Utc>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:3000".to_string(),
            identity_url: None,
            anon_key: String::new(),
            updated_at: Utc::now(),
        }
    }
}

impl CliConfig {
    pub fn identity_url(&self) -> &str {
        self.identity_url.as_deref().unwrap_or(&self.api_url)
    }
}

/// Persisted principal of the last sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub principal: Principal,
    pub signed_in_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            signed_in_at: Utc::now(),
        }
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("DOULA_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("papo-doula").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_cli_config() -> anyhow::Result<CliConfig> {
    let server_file = get_config_dir()?.join("server.json");

    if !server_file.exists() {
        return Ok(CliConfig::default());
    }

    let content = fs::read_to_string(server_file)?;
    let config: CliConfig = serde_json::from_str(&content)?;
    Ok(config)
}

pub fn save_cli_config(config: &CliConfig) -> anyhow::Result<()> {
    let server_file = get_config_dir()?.join("server.json");

    let content = serde_json::to_string_pretty(config)?;
    fs::write(server_file, content)?;
    Ok(())
}

pub fn load_session() -> anyhow::Result<Option<StoredSession>> {
    let session_file = get_config_dir()?.join("session.json");

    if !session_file.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(session_file)?;
    Ok(Some(serde_json::from_str(&content)?))
}

pub fn save_session(session: &StoredSession) -> anyhow::Result<()> {
    let session_file = get_config_dir()?.join("session.json");

    let content = serde_json::to_string_pretty(session)?;
    fs::write(session_file, content)?;
    Ok(())
}

pub fn clear_session() -> anyhow::Result<()> {
    let session_file = get_config_dir()?.join("session.json");
    if session_file.exists() {
        fs::remove_file(session_file)?;
    }
    Ok(())
}
