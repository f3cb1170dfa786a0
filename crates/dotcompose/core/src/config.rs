// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Configuration management for service composition

use crate::scheduling::ToposortOptions;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

pub const CONTINUE_ON_CYCLE_VAR: &str = "DOTCOMPOSE_CONTINUE_ON_CYCLE";
pub const LOG_COMPOSE_VAR: &str = "DOTCOMPOSE_LOG_COMPOSE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}, expected a boolean")]
    InvalidValue { key: &'static str, value: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for composing a service context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Break dependency cycles instead of failing composition
    pub continue_on_circular_dependency: bool,

    /// Report composition milestones through the log sink
    pub log_compose: bool,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            continue_on_circular_dependency: false,
            log_compose: true,
        }
    }
}

impl ComposeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; unset keys keep their defaults
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            continue_on_circular_dependency: parse_flag(CONTINUE_ON_CYCLE_VAR, lookup(CONTINUE_ON_CYCLE_VAR), defaults.continue_on_circular_dependency)?,
            log_compose: parse_flag(LOG_COMPOSE_VAR, lookup(LOG_COMPOSE_VAR), defaults.log_compose)?,
        })
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn toposort_options(&self) -> ToposortOptions {
        ToposortOptions {
            continue_on_circular_dependency: self.continue_on_circular_dependency,
        }
    }
}

fn parse_flag(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ComposeConfig::default();
        assert!(!config.continue_on_circular_dependency);
        assert!(config.log_compose);
        assert_eq!(ComposeConfig::from_vars(vars(&[])).unwrap(), config);
    }

    #[test]
    fn test_from_vars() {
        let config = ComposeConfig::from_vars(vars(&[(CONTINUE_ON_CYCLE_VAR, "yes"), (LOG_COMPOSE_VAR, "0")])).unwrap();

        assert!(config.continue_on_circular_dependency);
        assert!(!config.log_compose);
        assert!(config.toposort_options().continue_on_circular_dependency);
    }

    #[test]
    fn test_invalid_flag() {
        let error = ComposeConfig::from_vars(vars(&[(LOG_COMPOSE_VAR, "sometimes")])).unwrap_err();
        assert_eq!(error.to_string(), "Invalid value 'sometimes' for DOTCOMPOSE_LOG_COMPOSE, expected a boolean");
    }

    #[test]
    fn test_from_toml_str() {
        let config = ComposeConfig::from_toml_str("continue_on_circular_dependency = true").unwrap();

        assert!(config.continue_on_circular_dependency);
        assert!(config.log_compose);
        assert!(matches!(ComposeConfig::from_toml_str("log_compose = 3"), Err(ConfigError::Parse(_))));
    }
}
