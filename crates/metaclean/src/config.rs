//! Configuration types for the cleaning pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};

/// Default separator between entries of the `regex` / `regex_replace` lists.
pub const DEFAULT_REGEX_PAIR_DELIMITER: &str = " | ";

/// How regex pairs declared in a group are assigned to the group's columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RegexScope {
    /// Every column of a group gets the union of all pairs declared in the group.
    #[default]
    GroupUnion,
    /// Each column only gets the pairs declared on its own metadata row.
    PerColumn,
}

/// Configuration for the cleaning pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use metaclean::config::{PipelineConfig, RegexScope};
///
/// let config = PipelineConfig::builder()
///     .regex_scope(RegexScope::PerColumn)
///     .describe_output(true)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Assignment of regex pairs to the columns of a group.
    /// Default: GroupUnion
    pub regex_scope: RegexScope,

    /// Separator splitting multi-pair `regex` / `regex_replace` cells.
    /// Default: " | "
    pub regex_pair_delimiter: String,

    /// Whether to attach a per-column description of the cleaned table
    /// to the result.
    /// Default: false
    pub describe_output: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            regex_scope: RegexScope::default(),
            regex_pair_delimiter: DEFAULT_REGEX_PAIR_DELIMITER.to_string(),
            describe_output: false,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.regex_pair_delimiter.is_empty() {
            return Err(ConfigValidationError::EmptyDelimiter);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Regex pair delimiter must not be empty")]
    EmptyDelimiter,
}

impl From<ConfigValidationError> for crate::error::CleaningError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::CleaningError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    regex_scope: Option<RegexScope>,
    regex_pair_delimiter: Option<String>,
    describe_output: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set how regex pairs are distributed over a group's columns.
    pub fn regex_scope(mut self, scope: RegexScope) -> Self {
        self.regex_scope = Some(scope);
        self
    }

    /// Set the separator used to split multi-pair regex cells.
    pub fn regex_pair_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.regex_pair_delimiter = Some(delimiter.into());
        self
    }

    /// Enable or disable the description table in the result.
    pub fn describe_output(mut self, describe: bool) -> Self {
        self.describe_output = Some(describe);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            regex_scope: self.regex_scope.unwrap_or_default(),
            regex_pair_delimiter: self
                .regex_pair_delimiter
                .unwrap_or_else(|| DEFAULT_REGEX_PAIR_DELIMITER.to_string()),
            describe_output: self.describe_output.unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }
}
