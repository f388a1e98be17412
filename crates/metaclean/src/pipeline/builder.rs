//! Main cleaning pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! running the fixed stage sequence over a table.

use crate::config::PipelineConfig;
use crate::error::{CleaningError, Result};
use crate::metadata::{CleaningPlan, MetadataTable};
use crate::pipeline::progress::{
    CancellationToken, ClosureProgressReporter, CleaningStage, ProgressReporter, ProgressUpdate,
};
use crate::reporting::describe_table;
use crate::stages;
use crate::types::{CleaningResult, CleaningSummary, StageSummary};
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// The metadata-driven cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use metaclean::{CancellationToken, MetadataTable, Pipeline};
///
/// let metadata = MetadataTable::from_dataframe(&metadata_df)?;
/// let token = CancellationToken::new();
///
/// let result = Pipeline::builder()
///     .cancellation_token(token.clone())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(&df, &metadata)?;
///
/// println!("{} rows left", result.table.height());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: CancellationToken,
}

// Pipeline can be moved to a worker thread.
static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration the pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Clean `df` as directed by `metadata`.
    ///
    /// The caller's table is never modified: it is cloned once and the copy
    /// is threaded through the stages. The run stops at the first failing
    /// stage and no partial table is returned.
    ///
    /// # Errors
    ///
    /// Configuration errors (bad parameters, invalid regexes) are reported
    /// before any stage runs. Returns `Err(CleaningError::Cancelled)` if the
    /// cancellation token was triggered.
    pub fn process(&self, df: &DataFrame, metadata: &MetadataTable) -> Result<CleaningResult> {
        match self.process_internal(df, metadata) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Data cleaned"));
                Ok(result)
            }
            Err(e) => {
                if e.is_cancelled() {
                    self.report_progress(ProgressUpdate::cancelled());
                } else {
                    self.report_progress(ProgressUpdate::failed(e.to_string()));
                }
                error!("Cleaning failed: {}", e);
                Err(e)
            }
        }
    }

    /// Check if cancellation has been requested.
    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(CleaningError::Cancelled);
        }
        Ok(())
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, df: &DataFrame, metadata: &MetadataTable) -> Result<CleaningResult> {
        let start_time = Instant::now();

        info!("Cleaning data...");
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Initializing,
            0.0,
            "Compiling metadata",
        ));

        let plan = metadata.compile(&self.config)?;
        if plan.is_empty() {
            debug!("Metadata sets no flags; the table passes through unchanged");
        }

        let mut summary = CleaningSummary::new(df.height(), df.width());
        let mut table = df.clone();

        for stage in CleaningStage::PIPELINE_ORDER {
            self.check_cancelled()?;
            let (cleaned, stage_summary) = self.run_stage(stage, table, &plan)?;
            table = cleaned;
            summary.add_stage(stage_summary);
        }

        let description = if self.config.describe_output {
            Some(describe_table(&table)?)
        } else {
            None
        };

        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Data cleaned: {} rows x {} columns -> {} rows x {} columns in {}ms",
            summary.rows_before,
            summary.columns_before,
            summary.rows_after,
            summary.columns_after,
            summary.duration_ms
        );

        Ok(CleaningResult {
            table,
            summary,
            description,
        })
    }

    fn run_stage(
        &self,
        stage: CleaningStage,
        table: DataFrame,
        plan: &CleaningPlan,
    ) -> Result<(DataFrame, StageSummary)> {
        let started = Instant::now();
        let columns = plan.columns_for(stage);
        self.report_progress(ProgressUpdate::stage_started(stage, &columns));
        if !columns.is_empty() {
            info!("{}: {:?}", stage, columns);
        }

        let (rows_before, columns_before) = table.shape();
        let table = stages::apply(stage, table, plan)?;

        let stage_summary = StageSummary {
            stage,
            columns: columns.iter().map(|column| column.to_string()).collect(),
            rows_before,
            rows_after: table.height(),
            columns_before,
            columns_after: table.width(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        Ok((table, stage_summary))
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: Option<CancellationToken>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use metaclean::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct StageLogger;
    ///
    /// impl ProgressReporter for StageLogger {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         println!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(StageLogger))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// Shorthand for [`progress_reporter`](Self::progress_reporter) with a
    /// [`ClosureProgressReporter`].
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set a cancellation token for stopping the pipeline.
    ///
    /// The token is checked before every stage; once cancelled the run
    /// returns [`CleaningError::Cancelled`].
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, crate::config::ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
        })
    }
}
