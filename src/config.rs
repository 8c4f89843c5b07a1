//! Relationship manager settings parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::env::VarError;

use crate::consts::DEFAULT_MAX_CASCADE_DEPTH;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a boolean, got '{value}'")]
    InvalidBool { var: String, value: String },
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationsConfig {
    /// Whether overlap may form relationships without an explicit user action.
    pub auto_link: bool,
    /// Whether the manager refuses links that would close a cycle.
    pub enforce_acyclic: bool,
    /// Whether the standard rule table is registered on construction.
    pub standard_rules: bool,
    /// Maximum relationship hops one parent change may travel.
    pub max_cascade_depth: usize,
}

impl Default for RelationsConfig {
    fn default() -> Self {
        Self { auto_link: true, enforce_acyclic: true, standard_rules: true, max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH }
    }
}

impl RelationsConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `RELATIONS_AUTO_LINK`: default `true`
    /// - `RELATIONS_ENFORCE_ACYCLIC`: default `true`
    /// - `RELATIONS_STANDARD_RULES`: default `true`
    /// - `RELATIONS_MAX_CASCADE_DEPTH`: default 32
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Build config from an arbitrary key lookup. Unset keys keep defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a present value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            auto_link: parse_bool("RELATIONS_AUTO_LINK", lookup("RELATIONS_AUTO_LINK"), defaults.auto_link)?,
            enforce_acyclic: parse_bool(
                "RELATIONS_ENFORCE_ACYCLIC",
                lookup("RELATIONS_ENFORCE_ACYCLIC"),
                defaults.enforce_acyclic,
            )?,
            standard_rules: parse_bool(
                "RELATIONS_STANDARD_RULES",
                lookup("RELATIONS_STANDARD_RULES"),
                defaults.standard_rules,
            )?,
            max_cascade_depth: parse_usize(
                "RELATIONS_MAX_CASCADE_DEPTH",
                lookup("RELATIONS_MAX_CASCADE_DEPTH"),
                defaults.max_cascade_depth,
            )?,
        })
    }
}

/// Process environment as a lookup. A set but non-UTF-8 value comes back
/// lossily decoded so that parsing rejects it instead of using the default.
fn env_lookup(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) => Some(value),
        Err(VarError::NotPresent) => None,
        Err(VarError::NotUnicode(raw)) => Some(raw.to_string_lossy().into_owned()),
    }
}

fn parse_bool(var: &str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool { var: var.to_owned(), value: raw }),
    }
}

fn parse_usize(var: &str, raw: Option<String>, default: usize) -> Result<usize, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    raw.trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidNumber { var: var.to_owned(), value: raw.clone() })
}
