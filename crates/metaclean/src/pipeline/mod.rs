//! Pipeline module.
//!
//! This module provides the cleaning pipeline and its progress reporting.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use progress::{
    CancellationToken, ClosureProgressReporter, CleaningStage, ProgressReporter, ProgressUpdate,
};
