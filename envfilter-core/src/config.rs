//! Configuration management for `envfilter-core`.
//!
//! This module defines the top-level rule configuration. It handles
//! deserialization of YAML configurations and provides utilities for loading,
//! merging, and validating them.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::env2file::{validate_variable_name, Env2FileWrapper};
use crate::errors::EnvFilterError;
use crate::rules::{EnvironmentRule, Rule};

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// Represents the top-level configuration structure for envfilter.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    /// Rules applied, in order, to every environment preparation pass.
    pub rules: Vec<Rule>,
    /// Variables to externalize to files around the wrapped execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env2file: Option<Env2FileWrapper>,
}

impl FilterConfig {
    /// Loads and validates a configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading rules from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml_str(&text)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        info!("Loaded {} rules from file {}.", config.rules.len(), path.display());
        Ok(config)
    }

    /// Parses and validates a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: FilterConfig = serde_yml::from_str(text).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every rule and the env2file variable list, reporting all
    /// problems in one error.
    pub fn validate(&self) -> std::result::Result<(), EnvFilterError> {
        let mut errors = Vec::new();

        for (index, rule) in self.rules.iter().enumerate() {
            match rule {
                Rule::RegexValue(filter) => {
                    if filter.regex().is_none() {
                        warn!("Rule #{} ({}) has no pattern and will never match.", index + 1, rule.describe());
                    }
                    if let Err(e) = filter.validate() {
                        errors.push(format!("Rule #{}: {}", index + 1, e));
                    }
                }
                Rule::VariableContributing(filter) => {
                    if filter.key().is_empty() {
                        errors.push(format!("Rule #{} has an empty `key` field.", index + 1));
                    }
                }
            }
        }

        if let Some(wrapper) = &self.env2file {
            let mut seen = HashSet::new();
            for variable in wrapper.variables() {
                if let Err(e) = validate_variable_name(variable) {
                    errors.push(format!("env2file: {}", e));
                } else if !seen.insert(variable.as_str()) {
                    errors.push(format!("env2file: duplicate variable '{}'.", variable));
                }
            }
        }

        if errors.is_empty() {
            debug!("Configuration with {} rule(s) is valid.", self.rules.len());
            Ok(())
        } else {
            Err(EnvFilterError::Config(format!(
                "Rule validation failed:\n{}",
                errors.join("\n")
            )))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.env2file.is_none()
    }
}

/// Merges a user configuration over the defaults.
///
/// User rules run after the default rules; a user `env2file` section replaces
/// the default one.
pub fn merge_configs(default_config: FilterConfig, user_config: Option<FilterConfig>) -> FilterConfig {
    let Some(user) = user_config else {
        return default_config;
    };
    debug!(
        "Merging {} user rule(s) after {} default rule(s).",
        user.rules.len(),
        default_config.rules.len()
    );

    let mut rules = default_config.rules;
    rules.extend(user.rules);
    FilterConfig {
        rules,
        env2file: user.env2file.or(default_config.env2file),
    }
}
