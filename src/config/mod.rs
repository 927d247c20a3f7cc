//! Configuration layer: typed settings with layered precedence (file → env).

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const ENV_PREFIX: &str = "PRESSBOX";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_FORMAT: &str = "compact";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration could not be loaded: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid setting `{key}`: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Log output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

/// Endpoints and timeout for the HTTP collaborators.
#[derive(Debug, Clone)]
pub struct CollaboratorSettings {
    pub upload_url: Url,
    pub save_url: Url,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CoreSettings {
    pub collaborators: CollaboratorSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    collaborators: RawCollaborators,
    logging: RawLogging,
}

#[derive(Debug, Deserialize)]
struct RawCollaborators {
    upload_url: String,
    save_url: String,
    request_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct RawLogging {
    level: String,
    format: LogFormat,
}

/// Load settings from an optional file plus `PRESSBOX_`-prefixed
/// environment overrides (e.g. `PRESSBOX_COLLABORATORS__UPLOAD_URL`).
pub fn load(config_file: Option<&Path>) -> Result<CoreSettings, ConfigError> {
    let mut builder = Config::builder()
        .set_default("logging.level", DEFAULT_LOG_LEVEL)?
        .set_default("logging.format", DEFAULT_LOG_FORMAT)?
        .set_default(
            "collaborators.request_timeout_secs",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path));
    }
    let raw: RawSettings = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?
        .try_deserialize()?;
    CoreSettings::from_raw(raw)
}

impl CoreSettings {
    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let level = LevelFilter::from_str(&raw.logging.level).map_err(|err| {
            ConfigError::Invalid {
                key: "logging.level",
                message: err.to_string(),
            }
        })?;
        Ok(Self {
            collaborators: CollaboratorSettings {
                upload_url: parse_url("collaborators.upload_url", &raw.collaborators.upload_url)?,
                save_url: parse_url("collaborators.save_url", &raw.collaborators.save_url)?,
                request_timeout: Duration::from_secs(raw.collaborators.request_timeout_secs),
            },
            logging: LoggingSettings {
                level,
                format: raw.logging.format,
            },
        })
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|err| ConfigError::Invalid {
        key,
        message: err.to_string(),
    })
}
