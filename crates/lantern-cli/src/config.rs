//! Process configuration: `lantern.toml` + `LANTERN_*` environment overrides,
//! loaded once at startup via the `config` crate (spec's "replace the
//! module-level global" design note, applied to the whole CLI process).

use std::path::PathBuf;

use anyhow::{Context, Result};
use lantern_anchor::AnchorConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ChainSettings {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: u64,
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
}

fn default_db_path() -> String {
    "lantern.db".to_string()
}

fn default_checkpoint_interval() -> u64 {
    100
}

fn default_schema_version() -> String {
    "audit/1.1".to_string()
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            checkpoint_interval: default_checkpoint_interval(),
            schema_version: default_schema_version(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SigningSettings {
    #[serde(default = "default_kid")]
    pub kid: String,
    pub key_path: Option<PathBuf>,
}

fn default_kid() -> String {
    "default".to_string()
}

impl Default for SigningSettings {
    fn default() -> Self {
        Self {
            kid: default_kid(),
            key_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub chain: ChainSettings,
    #[serde(default)]
    pub signing: SigningSettings,
    #[serde(default)]
    pub anchor: AnchorConfig,
}

/// Load `<path>` (if it exists) layered under `LANTERN_`-prefixed
/// environment variables; falls back to all-default settings when no config
/// file is present.
pub fn load(path: Option<&PathBuf>) -> Result<AppConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path.as_path()).required(true));
    } else {
        builder = builder.add_source(config::File::with_name("lantern").required(false));
    }
    builder = builder.add_source(
        config::Environment::with_prefix("LANTERN")
            .separator("_")
            .try_parsing(true),
    );

    let built = builder.build().context("loading configuration")?;
    built
        .try_deserialize()
        .context("deserializing configuration")
}
