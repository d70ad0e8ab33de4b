//! Deserializable anchor configuration and the backend it builds.
//!
//! Built once at process startup (the "replace the module-level global"
//! design note) and passed explicitly to callers from then on.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::backend::AnchorBackend;
use crate::composite::CompositeBackend;
use crate::error::AnchorError;
use crate::log_only::LogOnlyBackend;
use crate::rfc3161::{Rfc3161Backend, Rfc3161Config};
use crate::s3_worm::{S3WormBackend, S3WormConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorsMode {
    Required,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorBackendType {
    LogOnly,
    S3Worm,
    Rfc3161,
    Both,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Settings {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_retention_mode")]
    pub retention_mode: String,
    #[serde(default)]
    pub cross_account_id: Option<String>,
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

fn default_retention_days() -> u32 {
    365
}

fn default_retention_mode() -> String {
    "COMPLIANCE".to_string()
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("./anchors/s3-worm")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TsaSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub trusted_fingerprints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorConfig {
    #[serde(rename = "type")]
    pub backend_type: AnchorBackendType,
    #[serde(default)]
    pub s3: S3Settings,
    #[serde(default)]
    pub tsa: TsaSettings,
    #[serde(default = "default_anchors_mode")]
    pub anchors_mode: AnchorsMode,
}

fn default_anchors_mode() -> AnchorsMode {
    AnchorsMode::Optional
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            backend_type: AnchorBackendType::LogOnly,
            s3: S3Settings::default(),
            tsa: TsaSettings::default(),
            anchors_mode: AnchorsMode::Optional,
        }
    }
}

impl AnchorConfig {
    /// Build the process-wide backend this config describes. `anchor-required`
    /// mode refuses to start with nothing but `log-only` active.
    pub fn build(&self) -> Result<Box<dyn AnchorBackend>, AnchorError> {
        let backend = self.build_backend()?;
        if self.anchors_mode == AnchorsMode::Required && backend.name() == "log-only" {
            return Err(AnchorError::AnchorRequiredNotSatisfied);
        }
        Ok(backend)
    }

    fn build_backend(&self) -> Result<Box<dyn AnchorBackend>, AnchorError> {
        match self.backend_type {
            AnchorBackendType::LogOnly => Ok(Box::new(LogOnlyBackend::new())),
            AnchorBackendType::S3Worm => Ok(Box::new(S3WormBackend::new(self.s3_worm_config()))),
            AnchorBackendType::Rfc3161 => {
                Ok(Box::new(Rfc3161Backend::new(self.rfc3161_config())))
            }
            AnchorBackendType::Both => {
                let children: Vec<Box<dyn AnchorBackend>> = vec![
                    Box::new(S3WormBackend::new(self.s3_worm_config())),
                    Box::new(Rfc3161Backend::new(self.rfc3161_config())),
                ];
                Ok(Box::new(CompositeBackend::new(children)))
            }
        }
    }

    fn s3_worm_config(&self) -> S3WormConfig {
        S3WormConfig {
            bucket: self.s3.bucket.clone(),
            prefix: self.s3.prefix.clone(),
            retention_days: self.s3.retention_days,
            retention_mode: self.s3.retention_mode.clone(),
            cross_account_id: self.s3.cross_account_id.clone(),
            base_dir: self.s3.base_dir.clone(),
        }
    }

    fn rfc3161_config(&self) -> Rfc3161Config {
        Rfc3161Config {
            tsa_url: self.tsa.url.clone(),
            trusted_fingerprints: self.tsa.trusted_fingerprints.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_mode_rejects_log_only() {
        let config = AnchorConfig {
            backend_type: AnchorBackendType::LogOnly,
            anchors_mode: AnchorsMode::Required,
            ..AnchorConfig::default()
        };
        assert!(matches!(
            config.build(),
            Err(AnchorError::AnchorRequiredNotSatisfied)
        ));
    }

    #[test]
    fn optional_mode_accepts_log_only() {
        let config = AnchorConfig::default();
        assert!(config.build().is_ok());
    }
}
