//! Writing cleaned tables and summaries to disk.

use crate::error::{Result, ResultExt};
use crate::types::CleaningSummary;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default base name of the cleaned table.
pub const DEFAULT_OUTPUT_NAME: &str = "df_clean";

/// Writes pipeline outputs into one directory under a common base name.
///
/// Given the base name `df_clean` the files are `df_clean.csv`,
/// `df_clean_description.csv` and `df_clean_summary.json`.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
    output_name: String,
}

impl OutputWriter {
    /// Create a writer. `output_name` defaults to [`DEFAULT_OUTPUT_NAME`].
    pub fn new(output_dir: impl Into<PathBuf>, output_name: Option<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            output_name: output_name.unwrap_or_else(|| DEFAULT_OUTPUT_NAME.to_string()),
        }
    }

    /// Path of the cleaned table.
    pub fn table_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.output_name))
    }

    /// Path of the description table.
    pub fn description_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_description.csv", self.output_name))
    }

    /// Path of the JSON summary.
    pub fn summary_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_summary.json", self.output_name))
    }

    /// Write the cleaned table as CSV.
    pub fn write_table(&self, df: &mut DataFrame) -> Result<PathBuf> {
        let path = self.table_path();
        self.write_csv(df, &path)?;
        info!("Dataset saved: {}", path.display());
        Ok(path)
    }

    /// Write the description table as CSV.
    pub fn write_description(&self, description: &mut DataFrame) -> Result<PathBuf> {
        let path = self.description_path();
        self.write_csv(description, &path)?;
        info!("Description saved: {}", path.display());
        Ok(path)
    }

    /// Write the summary as pretty-printed JSON.
    pub fn write_summary(&self, summary: &CleaningSummary) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.summary_path();
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(file, summary)?;
        info!("Summary saved: {}", path.display());
        Ok(path)
    }

    fn write_csv(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(df)
            .context(format!("Failed to write {}", path.display()))
    }
}
