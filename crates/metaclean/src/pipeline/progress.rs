//! Progress reporting and cancellation support for the cleaning pipeline.
//!
//! The pipeline never logs through process-wide state on behalf of its
//! caller: progress is pushed to an explicit [`ProgressReporter`] handed to
//! the pipeline builder, and cancellation is requested through a shared
//! [`CancellationToken`] that is checked before every stage.
//!
//! # Example
//!
//! ```rust,ignore
//! use metaclean::{Pipeline, CancellationToken};
//!
//! let token = CancellationToken::new();
//!
//! let result = Pipeline::builder()
//!     .cancellation_token(token.clone())
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .process(&df, &metadata);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stages of the cleaning pipeline.
///
/// The transformation stages are declared in the order the pipeline runs
/// them, so `Ord` follows execution order. `Initializing` precedes them and
/// the terminal states follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStage {
    /// Compiling the metadata into rules
    Initializing,
    /// Removing rows missing a value in any flagged column
    DropRowsWithNa,
    /// Replacing flagged columns with `<name>_bool` presence indicators
    DeriveToBool,
    /// Removing columns whose `keep_flag` is `0`
    DropColumns,
    /// Stripping characters from string values
    Strip,
    /// Converting dates to ordinal day numbers
    DateToOrdinal,
    /// Widening numeric columns to their string form
    FloatToObject,
    /// Zero-padding string forms to a fixed width
    ZeroFill,
    /// Filling missing values with a literal
    FillMissing,
    /// Applying regex groups
    RegexReplace,
    StrToInt,
    ObjectToInt,
    ObjectToFloat,
    FloatToInt,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline was cancelled
    Cancelled,
    /// Pipeline failed with an error
    Failed,
}

impl CleaningStage {
    /// The transformation stages in execution order.
    pub const PIPELINE_ORDER: [CleaningStage; 13] = [
        CleaningStage::DropRowsWithNa,
        CleaningStage::DeriveToBool,
        CleaningStage::DropColumns,
        CleaningStage::Strip,
        CleaningStage::DateToOrdinal,
        CleaningStage::FloatToObject,
        CleaningStage::ZeroFill,
        CleaningStage::FillMissing,
        CleaningStage::RegexReplace,
        CleaningStage::StrToInt,
        CleaningStage::ObjectToInt,
        CleaningStage::ObjectToFloat,
        CleaningStage::FloatToInt,
    ];

    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::DropRowsWithNa => "Drop rows with NA",
            Self::DeriveToBool => "Derive to bool",
            Self::DropColumns => "Drop columns",
            Self::Strip => "Strip",
            Self::DateToOrdinal => "Date to ordinal",
            Self::FloatToObject => "Float to object",
            Self::ZeroFill => "Zero fill",
            Self::FillMissing => "Fill missing",
            Self::RegexReplace => "Regex replace",
            Self::StrToInt => "String to int",
            Self::ObjectToInt => "Object to int",
            Self::ObjectToFloat => "Object to float",
            Self::FloatToInt => "Float to int",
            Self::Complete => "Complete",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        }
    }

    /// Position of this stage in [`PIPELINE_ORDER`](Self::PIPELINE_ORDER).
    pub fn position(&self) -> Option<usize> {
        Self::PIPELINE_ORDER.iter().position(|stage| stage == self)
    }

    /// Whether this stage transforms the table.
    pub fn is_transformation(&self) -> bool {
        self.position().is_some()
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Initializing | Self::Cancelled | Self::Failed => 0.0,
            Self::Complete => 1.0,
            stage => {
                let index = stage.position().unwrap_or_default();
                index as f32 / Self::PIPELINE_ORDER.len() as f32
            }
        }
    }

    /// Share of the overall progress covered by this stage.
    pub fn weight(&self) -> f32 {
        if self.is_transformation() {
            1.0 / Self::PIPELINE_ORDER.len() as f32
        } else {
            0.0
        }
    }
}

impl fmt::Display for CleaningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Progress update emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: CleaningStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,

    /// Number of columns the stage acts upon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns_total: Option<usize>,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage.
    pub fn new(stage: CleaningStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            columns_total: None,
        }
    }

    /// Creates the update announcing a stage and the columns it targets.
    pub fn stage_started(stage: CleaningStage, columns: &[&str]) -> Self {
        let message = if columns.is_empty() {
            format!("{stage}: nothing to do")
        } else {
            format!("{stage}: {}", columns.join(", "))
        };
        Self {
            columns_total: Some(columns.len()),
            ..Self::new(stage, 0.0, message)
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(CleaningStage::Complete, 1.0, message)
    }

    /// Creates a cancelled progress update.
    pub fn cancelled() -> Self {
        Self::new(CleaningStage::Cancelled, 0.0, "Pipeline cancelled")
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(CleaningStage::Failed, 0.0, message)
    }
}

/// Receives progress updates during cleaning.
///
/// Implementations must be `Send + Sync` so the pipeline can run on a
/// worker thread while updates are consumed elsewhere.
pub trait ProgressReporter: Send + Sync {
    /// Called at the start of every stage and once at the end of the run.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

/// Token for cancelling a running pipeline.
///
/// Clones share one flag. The pipeline checks it before each stage and
/// returns [`CleaningError::Cancelled`](crate::error::CleaningError::Cancelled)
/// once it is set.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(CancellationToken: Send, Sync);
static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

impl CancellationToken {
    /// Creates a new cancellation token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation of the pipeline.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Reset the token for reuse.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}
