//! Runtime settings read from the environment.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::factory::parse_flag;
use crate::gate::ParamGate;
use crate::logging::FailureLog;

/// Environment variable toggling failure logging.
pub const LOGGING_VAR: &str = "PARAM_GATE_LOGGING";

/// Environment variable setting the default box-all flag.
pub const BOX_ALL_VAR: &str = "PARAM_GATE_BOX_ALL";

/// Process-level defaults.
///
/// # Examples
///
/// ```
/// use param_gate::Settings;
///
/// let settings = Settings::from_lookup(|var| match var {
///     "PARAM_GATE_LOGGING" => Some("off".to_string()),
///     _ => None,
/// })
/// .unwrap();
///
/// assert!(!settings.logging_enabled);
/// assert!(settings.box_all);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Deliver failure records to sinks.
    pub logging_enabled: bool,
    /// Box undeclared parameters by default.
    pub box_all: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging_enabled: true,
            box_all: true,
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFlag`] if a variable is set to something
    /// that is not a boolean flag.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads settings through `lookup`; unset variables keep their default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFlag`] for a value that is not a flag.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            logging_enabled: flag(&lookup, LOGGING_VAR)?.unwrap_or(defaults.logging_enabled),
            box_all: flag(&lookup, BOX_ALL_VAR)?.unwrap_or(defaults.box_all),
        })
    }

    /// Applies the logging switch to `log`.
    pub fn apply(&self, log: &FailureLog) {
        if self.logging_enabled {
            log.enable();
        } else {
            log.disable();
        }
        tracing::debug!(
            logging_enabled = self.logging_enabled,
            box_all = self.box_all,
            "settings applied"
        );
    }

    /// Returns a fresh gate using these defaults.
    pub fn gate(&self) -> ParamGate {
        ParamGate::new().box_all(self.box_all)
    }
}

fn flag<F>(lookup: &F, var: &str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => parse_flag(&value)
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidFlag {
                var: var.to_string(),
                value,
            }),
    }
}
