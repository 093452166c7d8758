//! # Run Configuration
//!
//! Tunables for the run engine, with environment variable overrides.
//!
//! ## Environment Variables
//! - `PARLEY_PLANNING_MAX_ATTEMPTS` - Planning attempts before giving up (default: 3)
//! - `PARLEY_HISTORY_WINDOW` - Prior messages embedded in prompts (default: 5)
//! - `PARLEY_LOG_TRUNCATE_CHARS` - Max characters of prompts/responses in debug logs (default: 4000)

use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_PLANNING_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_HISTORY_WINDOW: usize = 5;
pub const DEFAULT_LOG_TRUNCATE_CHARS: usize = 4000;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

/// Run engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Planning calls per run, including the first
    pub planning_max_attempts: u32,
    /// How many trailing thread messages are shown to the model
    pub history_window: usize,
    pub log_truncate_chars: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            planning_max_attempts: DEFAULT_PLANNING_MAX_ATTEMPTS,
            history_window: DEFAULT_HISTORY_WINDOW,
            log_truncate_chars: DEFAULT_LOG_TRUNCATE_CHARS,
        }
    }
}

impl RunConfig {
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::new()
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    planning_max_attempts: u32,
    history_window: usize,
    log_truncate_chars: usize,
}

impl Default for RunConfigBuilder {
    fn default() -> Self {
        let defaults = RunConfig::default();
        Self {
            planning_max_attempts: defaults.planning_max_attempts,
            history_window: defaults.history_window,
            log_truncate_chars: defaults.log_truncate_chars,
        }
    }
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from defaults and apply any `PARLEY_*` overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::default();

        if let Some(attempts) = get_env_u32("PARLEY_PLANNING_MAX_ATTEMPTS")? {
            builder = builder.planning_max_attempts(attempts);
        }
        if let Some(window) = get_env_usize("PARLEY_HISTORY_WINDOW")? {
            builder = builder.history_window(window);
        }
        if let Some(chars) = get_env_usize("PARLEY_LOG_TRUNCATE_CHARS")? {
            builder = builder.log_truncate_chars(chars);
        }

        Ok(builder)
    }

    #[must_use]
    pub fn planning_max_attempts(mut self, attempts: u32) -> Self {
        self.planning_max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    #[must_use]
    pub fn log_truncate_chars(mut self, chars: usize) -> Self {
        self.log_truncate_chars = chars;
        self
    }

    /// Validate configuration and build `RunConfig`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the configuration is invalid.
    pub fn build(self) -> Result<RunConfig, ConfigError> {
        self.validate()?;

        Ok(RunConfig {
            planning_max_attempts: self.planning_max_attempts,
            history_window: self.history_window,
            log_truncate_chars: self.log_truncate_chars,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.planning_max_attempts == 0 {
            return Err(ConfigError::Validation(
                "planning_max_attempts must be greater than 0".to_string(),
            ));
        }
        if self.history_window == 0 {
            return Err(ConfigError::Validation(
                "history_window must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn get_env_u32(key: &str) -> Result<Option<u32>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse::<u32>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid u32 value '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}

fn get_env_usize(key: &str) -> Result<Option<usize>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse::<usize>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid usize value '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}
