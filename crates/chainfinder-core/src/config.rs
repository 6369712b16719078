//! Configuration management for chainfinder.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`CHAINFINDER__` prefix, `__` separator)
//! 2. Config file (`chainfinder.toml`, prefix overridable)
//! 3. Defaults

use serde::Deserialize;

use crate::error::{CoreError, Result};

/// Search settings, read from the `[search]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Hop bound used when the caller does not supply one.
    #[serde(default = "default_max_hops")]
    pub max_hops: i64,

    /// Run the parallel engine instead of the sequential one.
    #[serde(default)]
    pub parallel: bool,

    /// Output format for the CLI.
    #[serde(default)]
    pub format: OutputFormat,
}

/// How search results are rendered.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(CoreError::Config(format!(
                "Invalid format: {s}. Choose: text, json"
            ))),
        }
    }
}

fn default_max_hops() -> i64 {
    6
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            parallel: false,
            format: OutputFormat::default(),
        }
    }
}

impl Settings {
    /// Load settings from `{file_prefix}.toml` (optional) and the environment.
    ///
    /// A missing `[search]` section yields the defaults; a malformed file or
    /// value is reported as [`CoreError::Config`].
    pub fn load(file_prefix: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("CHAINFINDER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CoreError::Config(e.to_string()))?;

        match cfg.get::<Settings>("search") {
            Ok(s) => Ok(s),
            Err(config::ConfigError::NotFound(_)) => Ok(Settings::default()),
            Err(e) => Err(CoreError::Config(e.to_string())),
        }
    }
}
