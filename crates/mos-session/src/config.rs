//! Session configuration

use serde::{Deserialize, Serialize};

/// When the placement index verifies its own invariants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfCheck {
    /// Only on explicit request
    #[default]
    Never,

    /// After every insert, remove and clear
    OnMutation,
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the model root object
    pub root_name: String,
    /// Self-check policy of the placement index
    pub self_check: SelfCheck,
    /// Upper bound for scope chains walked during ascension
    pub max_path_depth: usize,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With root name
    #[inline]
    #[must_use]
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// With self-check policy
    #[inline]
    #[must_use]
    pub fn with_self_check(mut self, self_check: SelfCheck) -> Self {
        self.self_check = self_check;
        self
    }

    /// With maximum path depth
    #[inline]
    #[must_use]
    pub fn with_max_path_depth(mut self, depth: usize) -> Self {
        self.max_path_depth = depth;
        self
    }

    /// Parse configuration from JSON
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns error if the JSON is malformed or the values are unusable
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values for usability
    ///
    /// # Errors
    /// Returns error naming the offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_name.trim().is_empty() {
            return Err(ConfigError::Invalid("root_name must not be empty".into()));
        }
        if self.max_path_depth == 0 {
            return Err(ConfigError::Invalid("max_path_depth must be positive".into()));
        }
        Ok(())
    }

    /// Self-check policy in effect
    ///
    /// The `strict-debug` feature forces checking on every mutation.
    #[inline]
    #[must_use]
    pub fn effective_self_check(&self) -> SelfCheck {
        if cfg!(feature = "strict-debug") {
            SelfCheck::OnMutation
        } else {
            self.self_check
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            root_name: "model-root".to_string(),
            self_check: SelfCheck::Never,
            max_path_depth: 1024,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Malformed JSON
    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Unusable value
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
