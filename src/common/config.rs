//! Configuration schema, defaults, and layered loading.
//!
//! Precedence: defaults < config file < environment < CLI

use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "sendonce")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("sendonce.toml"))
}

/// Transfer service endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Base URL of the transfer service.
    pub base_url: String,
    /// Request timeout in seconds. Zero keeps the transport default.
    pub timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 0,
        }
    }
}

/// Fully resolved application configuration after all layers merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
}

impl AppConfig {
    /// Rejects base URLs the HTTP client cannot use.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.service.base_url).with_context(|| {
            format!(
                "Invalid config: service.base_url is not a URL: {}",
                self.service.base_url
            )
        })?;
        ensure!(
            matches!(url.scheme(), "http" | "https"),
            "Invalid config: service.base_url must be http or https"
        );
        ensure!(
            url.host_str().is_some(),
            "Invalid config: service.base_url has no host"
        );
        Ok(())
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn service_root(&self) -> String {
        self.service.base_url.trim_end_matches('/').to_string()
    }
}

/// Runtime overrides collected from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
}

/// Loads config from defaults/file/env, then applies CLI overrides.
pub fn load_config(overrides: &ConfigOverrides) -> Result<AppConfig> {
    let path = config_path();

    let mut config: AppConfig = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("SENDONCE_").split("__"))
        .extract()
        .context("Failed to load configuration")?;

    if let Some(base_url) = &overrides.base_url {
        config.service.base_url = base_url.clone();
    }

    config.validate()?;

    Ok(config)
}
