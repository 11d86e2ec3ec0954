//! Configuration file management for gaggle.
//!
//! Provides a TOML-based config file at `~/.config/gaggle/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use gaggle_core::llm::GatewayConfig;
use gaggle_db::config::DbConfig;

pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerSection>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DbConfig::DEFAULT_URL.to_owned(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: GatewayConfig::DEFAULT_BASE_URL.to_owned(),
            model: GatewayConfig::DEFAULT_MODEL.to_owned(),
            api_key: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserSection {
    /// Email address that identifies you as a trip owner or collaborator.
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerSection {
    /// Base URL used when building invite links.
    pub public_url: String,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the gaggle config directory: `$XDG_CONFIG_HOME/gaggle` or
/// `~/.config/gaggle`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("gaggle");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("gaggle")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents).context("failed to parse config file")
}

/// Write the config file, creating parent dirs as needed. The file may hold
/// an API key, so it is made owner-only on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct GaggleConfig {
    pub db_config: DbConfig,
    pub gateway: GatewayConfig,
    pub user: Option<String>,
    pub public_url: String,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl GaggleConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `GAGGLE_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - LLM: `GAGGLE_LLM_BASE_URL` / `GAGGLE_LLM_MODEL` / `GAGGLE_LLM_API_KEY` > `[llm]` > defaults
    /// - User: `cli_user` > `GAGGLE_USER` > `user.email`
    pub fn resolve(cli_db_url: Option<&str>, cli_user: Option<&str>) -> Result<Self> {
        let file = load_config().ok();

        let db_url = cli_db_url
            .map(str::to_owned)
            .or_else(|| env_var("GAGGLE_DATABASE_URL"))
            .or_else(|| file.as_ref().map(|f| f.database.url.clone()))
            .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_owned());

        let llm = file.as_ref().map(|f| &f.llm);
        let base_url = env_var("GAGGLE_LLM_BASE_URL")
            .or_else(|| llm.map(|l| l.base_url.clone()))
            .unwrap_or_else(|| GatewayConfig::DEFAULT_BASE_URL.to_owned());
        let model = env_var("GAGGLE_LLM_MODEL")
            .or_else(|| llm.map(|l| l.model.clone()))
            .unwrap_or_else(|| GatewayConfig::DEFAULT_MODEL.to_owned());
        let mut gateway = GatewayConfig::new(base_url, model);
        if let Some(key) = env_var(GatewayConfig::API_KEY_ENV).or_else(|| llm.and_then(|l| l.api_key.clone())) {
            gateway = gateway.with_api_key(key);
        }

        let user = cli_user
            .map(str::to_owned)
            .or_else(|| env_var("GAGGLE_USER"))
            .or_else(|| file.as_ref().and_then(|f| f.user.as_ref().map(|u| u.email.clone())))
            .map(|u| u.trim().to_lowercase());

        let public_url = file
            .as_ref()
            .and_then(|f| f.server.as_ref().map(|s| s.public_url.clone()))
            .unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_owned());

        Ok(Self {
            db_config: DbConfig::new(db_url),
            gateway,
            user,
            public_url,
        })
    }

    /// The acting user, required by every trip command.
    pub fn require_user(&self) -> Result<&str> {
        match self.user.as_deref() {
            Some(user) => Ok(user),
            None => bail!(
                "no user set; pass --as, set GAGGLE_USER, or run `gaggle init --user <email>`"
            ),
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
