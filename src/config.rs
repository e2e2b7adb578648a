//! # Runtime Settings
//!
//! Process-level configuration read once from the environment at startup.
//! Provider credentials live here; crawl and answer tuning live with the
//! components that use them (`CrawlerConfig`, `AnswerConfig`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::error::Error as CrateError;

/// Error type for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable is set to an unusable value
    #[error("invalid value for {key}: {value}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

impl From<ConfigError> for CrateError {
    fn from(err: ConfigError) -> Self {
        CrateError::Configuration(err.to_string())
    }
}

/// Which language-model / embedding provider backs the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" | "googleai" => Ok(ProviderKind::Gemini),
            _ => Err(ConfigError::Invalid {
                key: "SITESAGE_PROVIDER",
                value: s.to_string(),
            }),
        }
    }
}

/// Provider selection together with its credential
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: String,
}

/// Settings loaded from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    /// Provider strategy and credential
    pub provider: ProviderSettings,

    /// Path of the libsql database holding pages and documents
    pub database_path: PathBuf,

    /// Instruction prefixed to every question sent to the model
    pub instruction: Option<String>,

    /// Address the Ask endpoint listens on
    pub bind_addr: SocketAddr,
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = match lookup("SITESAGE_PROVIDER") {
            Some(value) => value.parse()?,
            None => ProviderKind::OpenAi,
        };

        let key_var = match kind {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        };
        let api_key = lookup(key_var)
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing(key_var))?;

        let database_path = lookup("SITESAGE_DATABASE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("sitesage.db"));

        let instruction = lookup("SITESAGE_INSTRUCTION").filter(|s| !s.trim().is_empty());

        let bind_raw = lookup("SITESAGE_BIND").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "SITESAGE_BIND",
            value: bind_raw.clone(),
        })?;

        Ok(Self {
            provider: ProviderSettings { kind, api_key },
            database_path,
            instruction,
            bind_addr,
        })
    }
}
