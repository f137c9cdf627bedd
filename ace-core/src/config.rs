//! Configuration system for ACE task adapters.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/ace/config.toml` and/or `.ace/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AceConfig {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Knobs for metric computation and confidence extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Lower bound applied to correct-label probabilities before taking the log.
    #[serde(default = "default_probability_floor")]
    pub probability_floor: f64,
    /// Lower bound on accuracy in the no-confidence perplexity proxy.
    /// The proxy therefore never exceeds `1 / fallback_accuracy_floor`.
    #[serde(default = "default_fallback_accuracy_floor")]
    pub fallback_accuracy_floor: f64,
    /// Keys in the generator's raw output holding a scalar confidence, tried in order.
    #[serde(default = "default_confidence_keys")]
    pub confidence_keys: Vec<String>,
    /// Key in the generator's raw output holding a per-label probability map.
    #[serde(default = "default_probabilities_key")]
    pub probabilities_key: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            probability_floor: default_probability_floor(),
            fallback_accuracy_floor: default_fallback_accuracy_floor(),
            confidence_keys: default_confidence_keys(),
            probabilities_key: default_probabilities_key(),
        }
    }
}

impl EvaluationConfig {
    /// Check that both floors are usable probabilities.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.probability_floor > 0.0 && self.probability_floor < 1.0) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "evaluation.probability_floor must be in (0, 1), got {}",
                    self.probability_floor
                ),
            });
        }
        if !(self.fallback_accuracy_floor > 0.0 && self.fallback_accuracy_floor <= 1.0) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "evaluation.fallback_accuracy_floor must be in (0, 1], got {}",
                    self.fallback_accuracy_floor
                ),
            });
        }
        Ok(())
    }
}

fn default_probability_floor() -> f64 {
    1e-10
}

fn default_fallback_accuracy_floor() -> f64 {
    0.01
}

fn default_confidence_keys() -> Vec<String> {
    vec!["confidence".to_string(), "probability".to_string()]
}

fn default_probabilities_key() -> String {
    "probabilities".to_string()
}

/// Logging configuration used by the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default stderr filter when no `-v`/`-q` flag is given.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Write structured JSON logs to a daily rolling file.
    #[serde(default = "default_true")]
    pub json_file: bool,
    /// Directory for the JSON log file (platform data dir if unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_file: true,
            log_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `ACE_`)
/// 3. Workspace-local config (`.ace/config.toml`)
/// 4. User config (`~/.config/ace/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&AceConfig>,
) -> Result<AceConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(AceConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // ACE_EVALUATION__PROBABILITY_FLOOR, ACE_LOGGING__LEVEL, etc.
    figment = figment.merge(Env::prefixed("ACE_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Load a single TOML file on top of the defaults, without environment layering.
pub fn load_config_file(path: &Path) -> Result<AceConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Figment::from(Serialized::defaults(AceConfig::default()))
        .merge(Toml::file(path))
        .extract()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

/// Check whether any configuration file exists (user-level or workspace-level).
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if user_config_path().is_some_and(|p| p.exists()) {
        return true;
    }
    workspace.is_some_and(|ws| workspace_config_path(ws).exists())
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "ace", "ace").map(|d| d.config_dir().join("config.toml"))
}

fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".ace").join("config.toml")
}
