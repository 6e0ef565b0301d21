//! Configuration management for the `shower` presenter.
//!
//! Settings come from a TOML file; command-line flags are applied on top by
//! the application.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shower::ShowerOptions;
use std::path::Path;
use tracing::info;

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Presentation options, keyed like the runtime options
    #[serde(default)]
    pub presentation: ShowerOptions,
    /// Where session state is kept between runs
    #[serde(default)]
    pub session: SessionSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Session persistence settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// JSON file holding session state. Kept in memory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Logging configuration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, writes the default configuration there and
    /// returns it.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Presentation options as the runtime's option map.
    pub fn presentation_options(&self) -> Map<String, Value> {
        self.presentation.to_map()
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        let presentation = &self.presentation;
        for (name, value) in [
            ("container_selector", &presentation.container_selector),
            ("slides_selector", &presentation.slides_selector),
            ("sessionstore_key", &presentation.sessionstore_key),
            ("mode_full_classname", &presentation.mode_full_classname),
            ("mode_list_classname", &presentation.mode_list_classname),
        ] {
            if value.trim().is_empty() {
                return Err(format!("presentation.{name} cannot be empty"));
            }
        }

        if presentation.mode_full_classname == presentation.mode_list_classname {
            return Err("presentation mode class names must differ".to_string());
        }

        if self.session.file.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return Err("session.file cannot be empty".to_string());
        }

        Ok(())
    }
}
