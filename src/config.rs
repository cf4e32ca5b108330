//! Minimal `NodeConfig` loading: just enough to bootstrap a [`crate::Runtime`]
//! (spec §6). Loading every `producer-<n>`/`consumer-<n>`/`import-<n>` range,
//! archival folders, and mail settings from a full application config file
//! is out of scope — that belongs to the embedding application.

use std::path::Path;

use serde::Deserialize;
use uuid::Uuid;

/// Bootstrapped node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub uuid: Uuid,
    pub name: String,
    pub version: String,
    pub core_version: String,
    pub user_label: Option<String>,
    pub lossless_dir: String,
    pub tuning: TuningConfig,
}

/// Tuning knobs for the shared moderators and timeouts (spec §6).
#[derive(Debug, Clone)]
pub struct TuningConfig {
    pub reset_request_window_secs: u64,
    pub lossless_resend_rate_per_min: u64,
    pub resetter_pump_rate_per_min: u64,
    pub resetter_capacity: usize,
    pub query_default_expiry_secs: u64,
    pub periodic_interval_secs: u64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        TuningConfig {
            reset_request_window_secs: 180,
            lossless_resend_rate_per_min: 30_000,
            resetter_pump_rate_per_min: 30_000,
            resetter_capacity: 200_000,
            query_default_expiry_secs: 10,
            periodic_interval_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    uuid: Option<String>,
    name: Option<String>,
    version: Option<String>,
    core_version: Option<String>,
    user_label: Option<String>,
    lossless_dir: Option<String>,
    tuning: Option<RawTuningConfig>,
}

#[derive(Debug, Deserialize)]
struct RawTuningConfig {
    reset_request_window_secs: Option<u64>,
    lossless_resend_rate_per_min: Option<u64>,
    resetter_pump_rate_per_min: Option<u64>,
    resetter_capacity: Option<usize>,
    query_default_expiry_secs: Option<u64>,
    periodic_interval_secs: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config file '{path}': {source}")]
    Io { path: String, source: std::io::Error },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required field: {0}")]
    MissingField(String),
    #[error("invalid config value for {field}: {detail}")]
    InvalidValue { field: String, detail: String },
}

impl NodeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let toml_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        Self::from_str(&toml_str)
    }

    pub fn from_str(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(toml_str)?;

        let name = raw.name.ok_or_else(|| ConfigError::MissingField("name".to_owned()))?;
        let uuid = match raw.uuid {
            Some(s) => Uuid::parse_str(&s)
                .map_err(|e| ConfigError::InvalidValue { field: "uuid".to_owned(), detail: e.to_string() })?,
            None => Uuid::new_v4(),
        };

        let tuning = match raw.tuning {
            Some(t) => TuningConfig {
                reset_request_window_secs: t.reset_request_window_secs.unwrap_or(180),
                lossless_resend_rate_per_min: t.lossless_resend_rate_per_min.unwrap_or(30_000),
                resetter_pump_rate_per_min: t.resetter_pump_rate_per_min.unwrap_or(30_000),
                resetter_capacity: t.resetter_capacity.unwrap_or(200_000),
                query_default_expiry_secs: t.query_default_expiry_secs.unwrap_or(10),
                periodic_interval_secs: t.periodic_interval_secs.unwrap_or(60),
            },
            None => TuningConfig::default(),
        };

        Ok(NodeConfig {
            uuid,
            name,
            version: raw.version.unwrap_or_else(|| "0.0.0".to_owned()),
            core_version: raw.core_version.unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_owned()),
            user_label: raw.user_label,
            lossless_dir: raw.lossless_dir.unwrap_or_else(|| "./lossless".to_owned()),
            tuning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_name_is_rejected() {
        let err = NodeConfig::from_str("version = \"1.0\"").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(field) if field == "name"));
    }

    #[test]
    fn minimal_config_fills_in_defaults() {
        let cfg = NodeConfig::from_str("name = \"node-a\"").unwrap();
        assert_eq!(cfg.name, "node-a");
        assert_eq!(cfg.tuning.reset_request_window_secs, 180);
        assert_eq!(cfg.lossless_dir, "./lossless");
    }

    #[test]
    fn explicit_tuning_overrides_defaults() {
        let cfg = NodeConfig::from_str(
            r#"
            name = "node-a"
            [tuning]
            resetter_capacity = 50
            "#,
        )
        .unwrap();
        assert_eq!(cfg.tuning.resetter_capacity, 50);
        assert_eq!(cfg.tuning.lossless_resend_rate_per_min, 30_000);
    }

    #[test]
    fn invalid_uuid_is_rejected() {
        let err = NodeConfig::from_str("name = \"n\"\nuuid = \"not-a-uuid\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "uuid"));
    }
}
