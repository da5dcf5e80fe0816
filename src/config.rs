//! Sidecar configuration: a YAML file merged with `ROLLBOOK_`-prefixed
//! environment overrides. Loaded once at startup; the engine itself
//! never reads configuration.

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable naming an alternate config file path.
pub const CONFIG_PATH_VAR: &str = "ROLLBOOKD_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "rollbookd.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Http,
    Fixture,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub base_url: String,
    pub token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: Backend,
    pub http: Option<HttpConfig>,
    pub fixture: Option<FixtureConfig>,
}

impl AppConfig {
    /// Loads from `$ROLLBOOKD_CONFIG`, falling back to
    /// `rollbookd.yaml` in the working directory. A missing file is
    /// fine; environment overrides alone can carry a full config.
    pub fn load() -> anyhow::Result<AppConfig> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> anyhow::Result<AppConfig> {
        Config::builder()
            .add_source(File::with_name(path).format(FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix("ROLLBOOK")
                    .try_parsing(true)
                    .separator("__"),
            )
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("configuration did not match the expected shape")
    }
}
