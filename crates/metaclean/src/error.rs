//! Custom error types for the cleaning pipeline.
//!
//! Every error aborts the whole run: they stem from configuration or data
//! defects that retrying cannot fix. Errors are serializable so a caller can
//! forward them to a UI or a JSON log as `{code, message}`.

use crate::pipeline::CleaningStage;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// Pipeline was cancelled through its cancellation token.
    #[error("Pipeline cancelled")]
    Cancelled,

    /// The metadata table has more than one row for a column.
    #[error("Metadata declares column '{0}' more than once")]
    DuplicateColumnMetadata(String),

    /// A flagged column does not exist in the table when its stage runs.
    #[error("{stage}: column '{column}' referenced by metadata is not in the table")]
    MissingReferencedColumn { stage: CleaningStage, column: String },

    /// A value cannot be converted to the stage's target type.
    #[error("{stage}: cannot convert value '{value}' in column '{column}'")]
    ColumnCoercionError {
        stage: CleaningStage,
        column: String,
        value: String,
    },

    /// `fill_na_with` holds something other than `TRUE`, `FALSE` or `0`.
    #[error("Unrecognized fill literal '{literal}' for column '{column}' (expected TRUE, FALSE or 0)")]
    UnrecognizedFillLiteral { column: String, literal: String },

    /// The metadata table is missing something a set flag needs.
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// A regex pattern from the metadata does not compile.
    #[error("Invalid regex '{pattern}' in group '{group}': {reason}")]
    InvalidRegex {
        group: String,
        pattern: String,
        reason: String,
    },

    /// Invalid pipeline configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleaningError>,
    },
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for callers that dispatch on the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => "CANCELLED",
            Self::DuplicateColumnMetadata(_) => "DUPLICATE_COLUMN_METADATA",
            Self::MissingReferencedColumn { .. } => "MISSING_REFERENCED_COLUMN",
            Self::ColumnCoercionError { .. } => "COLUMN_COERCION_ERROR",
            Self::UnrecognizedFillLiteral { .. } => "UNRECOGNIZED_FILL_LITERAL",
            Self::InvalidMetadata(_) => "INVALID_METADATA",
            Self::InvalidRegex { .. } => "INVALID_REGEX",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// The stage that raised this error, if it was raised by a stage.
    pub fn stage(&self) -> Option<CleaningStage> {
        match self {
            Self::MissingReferencedColumn { stage, .. }
            | Self::ColumnCoercionError { stage, .. } => Some(*stage),
            Self::UnrecognizedFillLiteral { .. } => Some(CleaningStage::FillMissing),
            Self::InvalidRegex { .. } => Some(CleaningStage::RegexReplace),
            Self::WithContext { source, .. } => source.stage(),
            _ => None,
        }
    }

    /// Check if this error represents a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::WithContext { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Check if the error points at the metadata rather than the data.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::DuplicateColumnMetadata(_)
            | Self::MissingReferencedColumn { .. }
            | Self::UnrecognizedFillLiteral { .. }
            | Self::InvalidMetadata(_)
            | Self::InvalidRegex { .. }
            | Self::InvalidConfig(_) => true,
            Self::WithContext { source, .. } => source.is_configuration_error(),
            _ => false,
        }
    }
}

impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(CleaningError::Cancelled.error_code(), "CANCELLED");
        assert_eq!(
            CleaningError::DuplicateColumnMetadata("id".to_string()).error_code(),
            "DUPLICATE_COLUMN_METADATA"
        );
    }

    #[test]
    fn test_coercion_error_message() {
        let error = CleaningError::ColumnCoercionError {
            stage: CleaningStage::ObjectToFloat,
            column: "amount".to_string(),
            value: "N/A".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("amount"));
        assert!(message.contains("N/A"));
        assert!(message.contains("Object to float"));
        assert_eq!(error.stage(), Some(CleaningStage::ObjectToFloat));
    }

    #[test]
    fn test_is_configuration_error() {
        assert!(CleaningError::InvalidMetadata("x".to_string()).is_configuration_error());
        assert!(
            CleaningError::UnrecognizedFillLiteral {
                column: "a".to_string(),
                literal: "yes".to_string(),
            }
            .is_configuration_error()
        );
        assert!(
            !CleaningError::ColumnCoercionError {
                stage: CleaningStage::StrToInt,
                column: "a".to_string(),
                value: "x".to_string(),
            }
            .is_configuration_error()
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = CleaningError::MissingReferencedColumn {
            stage: CleaningStage::DropColumns,
            column: "note".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("MISSING_REFERENCED_COLUMN"));
        assert!(json.contains("note"));
    }

    #[test]
    fn test_with_context_preserves_kind() {
        let error = CleaningError::Cancelled.with_context("Before strip stage");
        assert!(error.to_string().contains("Before strip stage"));
        assert_eq!(error.error_code(), "CANCELLED");
        assert!(error.is_cancelled());
    }
}
