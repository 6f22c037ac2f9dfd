//! Allocator configuration.
//!
//! Load engine settings from TOML to change scoring weights and policy
//! flags without code changes. Every field has a default; the defaults
//! reproduce the documented scoring formula exactly.
//!
//! # Example
//!
//! ```
//! use u_roomalloc::config::AllocatorConfig;
//!
//! let config = AllocatorConfig::from_toml_str(r#"
//!     capacity_is_hard = true
//!     parallel_scoring = true
//!
//!     [weights]
//!     history = 2
//! "#).unwrap();
//!
//! assert!(config.capacity_is_hard);
//! assert_eq!(config.weights.history, 2);
//! assert_eq!(config.weights.hard_rule, 4);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Points awarded per scoring signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Per satisfied hard rule.
    pub hard_rule: u32,
    /// Per professor preference naming the room.
    pub preferred_room: u32,
    /// Per professor feature preference the room carries.
    pub preferred_feature: u32,
    /// When the room seats the whole demand.
    pub capacity: u32,
    /// Per prior-term allocation of the course to the room.
    pub history: u32,
    /// Per satisfied soft-tier rule.
    pub soft_rule: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            hard_rule: 4,
            preferred_room: 2,
            preferred_feature: 2,
            capacity: 1,
            history: 1,
            soft_rule: 0,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Exclude rooms that cannot seat the demand, in every phase.
    ///
    /// Off by default: insufficient capacity only forfeits the capacity
    /// bonus.
    pub capacity_is_hard: bool,

    /// Report a blank schedule code as `no-scheduled-blocks` instead of
    /// as a parse failure.
    pub allow_empty_schedule: bool,

    /// Score candidate rooms in parallel using rayon.
    ///
    /// Ranking and commits stay sequential, so results are identical.
    pub parallel_scoring: bool,

    /// Scoring weights.
    pub weights: ScoreWeights,
}

impl AllocatorConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Enforces capacity as a hard requirement.
    pub fn with_capacity_hard(mut self, hard: bool) -> Self {
        self.capacity_is_hard = hard;
        self
    }

    /// Tolerates blank schedule codes.
    pub fn with_allow_empty_schedule(mut self, allow: bool) -> Self {
        self.allow_empty_schedule = allow;
        self
    }

    /// Enables parallel candidate scoring.
    pub fn with_parallel_scoring(mut self, parallel: bool) -> Self {
        self.parallel_scoring = parallel;
        self
    }

    /// Replaces the scoring weights.
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Checks the configuration for unusable values.
    ///
    /// # Errors
    /// Rejects a zero hard-rule weight: compliant rooms would then score
    /// `hardCompliance = 0`, which is the disqualification marker.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.weights.hard_rule == 0 {
            return Err(ConfigError::Invalid(
                "weights.hard_rule must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = AllocatorConfig::default();
        assert!(!c.capacity_is_hard);
        assert!(!c.allow_empty_schedule);
        assert!(!c.parallel_scoring);
        assert_eq!(c.weights, ScoreWeights::default());
        assert_eq!(c.weights.hard_rule, 4);
        assert_eq!(c.weights.soft_rule, 0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let c = AllocatorConfig::from_toml_str("").unwrap();
        assert_eq!(c, AllocatorConfig::default());
    }

    #[test]
    fn test_partial_weights() {
        let c = AllocatorConfig::from_toml_str(
            r#"
            allow_empty_schedule = true
            [weights]
            preferred_room = 5
            soft_rule = 1
            "#,
        )
        .unwrap();
        assert!(c.allow_empty_schedule);
        assert_eq!(c.weights.preferred_room, 5);
        assert_eq!(c.weights.soft_rule, 1);
        assert_eq!(c.weights.capacity, 1);
    }

    #[test]
    fn test_zero_hard_weight_rejected() {
        let err = AllocatorConfig::from_toml_str("[weights]\nhard_rule = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_toml() {
        let err = AllocatorConfig::from_toml_str("capacity_is_hard = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AllocatorConfig::from_toml_file("/nonexistent/roomalloc.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_builders() {
        let c = AllocatorConfig::new()
            .with_capacity_hard(true)
            .with_allow_empty_schedule(true)
            .with_parallel_scoring(true)
            .with_weights(ScoreWeights {
                history: 3,
                ..ScoreWeights::default()
            });
        assert!(c.capacity_is_hard && c.allow_empty_schedule && c.parallel_scoring);
        assert_eq!(c.weights.history, 3);
    }
}
