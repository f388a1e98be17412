//! Per-column description of a table.

use crate::error::Result;
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Description of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub column_name: String,
    pub dtype: String,
    pub missing_count: usize,
    /// Number of non-missing values.
    pub count: usize,
    pub unique_count: usize,
    /// Statistics below are only computed for numeric columns.
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnDescription {
    /// Describe `series`.
    pub fn from_series(series: &Series) -> Result<Self> {
        let missing_count = series.null_count();
        let mut description = Self {
            column_name: series.name().to_string(),
            dtype: series.dtype().to_string(),
            missing_count,
            count: series.len() - missing_count,
            unique_count: series.drop_nulls().n_unique()?,
            mean: None,
            std: None,
            min: None,
            max: None,
        };

        if is_numeric_dtype(series.dtype()) {
            let floats = series.cast(&DataType::Float64)?;
            let floats = floats.f64()?;
            description.mean = floats.mean();
            description.std = floats.std(1);
            description.min = floats.min();
            description.max = floats.max();
        }

        Ok(description)
    }
}

/// Describe every column of `df`, in column order.
pub fn describe_columns(df: &DataFrame) -> Result<Vec<ColumnDescription>> {
    df.get_columns()
        .iter()
        .map(|column| ColumnDescription::from_series(column.as_materialized_series()))
        .collect()
}

/// Describe `df` as a table with one row per column.
///
/// The first three columns are `column_name`, `dtype` and `missing_count`.
pub fn describe_table(df: &DataFrame) -> Result<DataFrame> {
    let descriptions = describe_columns(df)?;

    let text = |f: fn(&ColumnDescription) -> String| -> Vec<String> {
        descriptions.iter().map(f).collect()
    };
    let counts = |f: fn(&ColumnDescription) -> usize| -> Vec<u64> {
        descriptions.iter().map(|d| f(d) as u64).collect()
    };
    let stats = |f: fn(&ColumnDescription) -> Option<f64>| -> Vec<Option<f64>> {
        descriptions.iter().map(f).collect()
    };

    let table = df!(
        "column_name" => text(|d| d.column_name.clone()),
        "dtype" => text(|d| d.dtype.clone()),
        "missing_count" => counts(|d| d.missing_count),
        "count" => counts(|d| d.count),
        "unique_count" => counts(|d| d.unique_count),
        "mean" => stats(|d| d.mean),
        "std" => stats(|d| d.std),
        "min" => stats(|d| d.min),
        "max" => stats(|d| d.max)
    )?;
    Ok(table)
}
