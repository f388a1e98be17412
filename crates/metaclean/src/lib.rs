//! Metadata-driven cleaning of tabular data, built on Polars.
//!
//! # Overview
//!
//! A companion *metadata table* holds one row per column of the data table.
//! Its flag cells (`"1"` = set) select which columns each stage acts upon and
//! its parameter cells configure the stage. The pipeline runs thirteen stages
//! in a fixed order:
//!
//! 1. drop rows with missing values
//! 2. derive presence indicators (`<name>_bool`)
//! 3. drop columns (`keep_flag = 0`)
//! 4. strip characters
//! 5. date to ordinal
//! 6. float to object
//! 7. zero fill
//! 8. fill missing values
//! 9. regex replace, by group
//! 10. string to int, object to int, object to float, float to int
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use metaclean::{MetadataTable, Pipeline};
//! use polars::prelude::*;
//!
//! let data = CsvReadOptions::default()
//!     .try_into_reader_with_file_path(Some("data.csv".into()))?
//!     .finish()?;
//! let metadata = CsvReadOptions::default()
//!     .with_infer_schema_length(Some(0))
//!     .try_into_reader_with_file_path(Some("metadata.csv".into()))?
//!     .finish()?;
//!
//! let metadata = MetadataTable::from_dataframe(&metadata)?;
//! let result = Pipeline::builder().build()?.process(&data, &metadata)?;
//!
//! println!("{}", result.table);
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use metaclean::config::{PipelineConfig, RegexScope};
//!
//! let config = PipelineConfig::builder()
//!     .regex_scope(RegexScope::PerColumn)  // pairs apply to their own row only
//!     .regex_pair_delimiter(" | ")
//!     .describe_output(true)               // attach a per-column description
//!     .build()?;
//! ```
//!
//! # Progress Reporting
//!
//! ```rust,ignore
//! use metaclean::{CancellationToken, CleaningError, Pipeline};
//!
//! let token = CancellationToken::new();
//!
//! let result = Pipeline::builder()
//!     .cancellation_token(token.clone())
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .process(&data, &metadata);
//!
//! match result {
//!     Ok(result) => println!("{} rows", result.table.height()),
//!     Err(CleaningError::Cancelled) => println!("Cancelled by user"),
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```

pub mod config;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod reporting;
pub mod stages;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder, RegexScope};
pub use error::{CleaningError, ResultExt};
pub use metadata::{
    CleaningPlan, ColumnRule, FillLiteral, Flag, MetadataRow, MetadataTable, Param, RegexGroup,
    RegexReplacement,
};
pub use pipeline::{
    CancellationToken, CleaningStage, ClosureProgressReporter, Pipeline, PipelineBuilder,
    ProgressReporter, ProgressUpdate,
};
pub use reporting::{ColumnDescription, OutputWriter, describe_columns, describe_table};
pub use stages::remove_commas;
pub use types::{CleaningResult, CleaningSummary, StageSummary};
pub use utils::{DtypeCategory, get_dtype_category, is_numeric_dtype, zero_pad};
