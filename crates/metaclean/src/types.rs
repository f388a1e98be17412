use crate::pipeline::CleaningStage;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Output of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct CleaningResult {
    /// The cleaned table.
    pub table: DataFrame,
    /// What each stage did.
    pub summary: CleaningSummary,
    /// Per-column description of the cleaned table, when requested.
    pub description: Option<DataFrame>,
}

// ============================================================================
// Cleaning Summary Types
// ============================================================================

/// Record of one stage execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: CleaningStage,
    /// Columns the metadata pointed this stage at.
    pub columns: Vec<String>,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    pub duration_ms: u64,
}

impl StageSummary {
    /// Whether the stage had any column to act upon.
    pub fn was_applied(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Number of rows the stage removed.
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// Human-readable summary of what the pipeline did.
///
/// Serializes to JSON for the CLI's `--json` output.
///
/// # Example
///
/// ```rust,ignore
/// let summary = result.summary;
/// println!("Cleaned {} rows in {}ms", summary.rows_after, summary.duration_ms);
/// for stage in summary.applied_stages() {
///     println!("{}: {}", stage.stage, stage.columns.join(", "));
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Number of rows before cleaning.
    pub rows_before: usize,
    /// Number of rows after cleaning.
    pub rows_after: usize,
    /// Number of rows removed during cleaning.
    pub rows_removed: usize,

    /// Number of columns before cleaning.
    pub columns_before: usize,
    /// Number of columns after cleaning.
    pub columns_after: usize,

    /// One entry per executed stage, in execution order.
    pub stages: Vec<StageSummary>,
}

impl CleaningSummary {
    /// Start a summary for a table of the given shape.
    pub fn new(rows_before: usize, columns_before: usize) -> Self {
        Self {
            rows_before,
            columns_before,
            rows_after: rows_before,
            columns_after: columns_before,
            ..Self::default()
        }
    }

    /// Record a stage execution.
    pub fn add_stage(&mut self, stage: StageSummary) {
        self.rows_after = stage.rows_after;
        self.columns_after = stage.columns_after;
        self.rows_removed = self.rows_before.saturating_sub(self.rows_after);
        self.stages.push(stage);
    }

    /// Stages that had at least one column to act upon.
    pub fn applied_stages(&self) -> impl Iterator<Item = &StageSummary> {
        self.stages.iter().filter(|stage| stage.was_applied())
    }

    /// The summary of `stage`, if it ran.
    pub fn stage(&self, stage: CleaningStage) -> Option<&StageSummary> {
        self.stages.iter().find(|summary| summary.stage == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(stage: CleaningStage, columns: &[&str], rows: (usize, usize)) -> StageSummary {
        StageSummary {
            stage,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows_before: rows.0,
            rows_after: rows.1,
            columns_before: 3,
            columns_after: 3,
            duration_ms: 0,
        }
    }

    #[test]
    fn test_summary_tracks_last_stage_shape() {
        let mut summary = CleaningSummary::new(10, 3);
        summary.add_stage(stage(CleaningStage::DropRowsWithNa, &["a"], (10, 7)));
        summary.add_stage(stage(CleaningStage::DeriveToBool, &[], (7, 7)));

        assert_eq!(summary.rows_after, 7);
        assert_eq!(summary.rows_removed, 3);
        assert_eq!(summary.applied_stages().count(), 1);
        assert_eq!(
            summary.stage(CleaningStage::DropRowsWithNa).map(StageSummary::rows_removed),
            Some(3)
        );
    }

    #[test]
    fn test_summary_json() {
        let mut summary = CleaningSummary::new(2, 1);
        summary.add_stage(stage(CleaningStage::ZeroFill, &["zip"], (2, 2)));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["stages"][0]["stage"], "zero_fill");
        assert_eq!(json["stages"][0]["columns"][0], "zip");
        assert_eq!(json["rows_removed"], 0);
    }
}
