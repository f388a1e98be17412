//! Row-level filtering.

use super::require_column;
use crate::error::Result;
use crate::metadata::CleaningPlan;
use crate::pipeline::CleaningStage;
use polars::prelude::*;
use tracing::debug;

/// Remove every row missing a value in any column flagged `drop_rows_with_na`.
///
/// Running the stage twice gives the same table as running it once.
pub fn drop_rows_with_na(df: DataFrame, plan: &CleaningPlan) -> Result<DataFrame> {
    let columns = plan.columns_for(CleaningStage::DropRowsWithNa);
    if columns.is_empty() {
        return Ok(df);
    }

    let mut keep = BooleanChunked::full("keep".into(), true, df.height());
    for column in &columns {
        let series = require_column(&df, CleaningStage::DropRowsWithNa, column)?;
        keep = &keep & &series.is_not_null();
    }

    let before = df.height();
    let df = df.filter(&keep)?;
    debug!(
        "Dropped {} rows with missing values in {:?}",
        before - df.height(),
        columns
    );
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::metadata::{Flag, MetadataRow, MetadataTable};

    fn plan(columns: &[&str]) -> CleaningPlan {
        MetadataTable::from_rows(
            columns
                .iter()
                .map(|column| MetadataRow::new(*column).with_flag(Flag::DropRowsWithNa)),
        )
        .unwrap()
        .compile(&PipelineConfig::default())
        .unwrap()
    }

    fn sample() -> DataFrame {
        df!(
            "a" => &[Some(1i64), None, Some(3), Some(4)],
            "b" => &[Some("x"), Some("y"), None, Some("w")],
            "c" => &[None, Some(2.0f64), Some(3.0), Some(4.0)]
        )
        .unwrap()
    }

    #[test]
    fn test_drops_rows_missing_in_any_flagged_column() {
        let out = drop_rows_with_na(sample(), &plan(&["a", "b"])).unwrap();
        assert_eq!(out.height(), 2);
        let a: Vec<Option<i64>> = out.column("a").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(a, vec![Some(1), Some(4)]);
    }

    #[test]
    fn test_unflagged_nulls_are_kept() {
        let out = drop_rows_with_na(sample(), &plan(&["b"])).unwrap();
        assert_eq!(out.height(), 3);
        assert_eq!(out.column("c").unwrap().null_count(), 1);
    }

    #[test]
    fn test_idempotent() {
        let plan = plan(&["a", "c"]);
        let once = drop_rows_with_na(sample(), &plan).unwrap();
        let twice = drop_rows_with_na(once.clone(), &plan).unwrap();
        assert!(once.equals_missing(&twice));
    }

    #[test]
    fn test_no_rows_left() {
        let df = df!("a" => &[None::<i64>, None]).unwrap();
        let out = drop_rows_with_na(df, &plan(&["a"])).unwrap();
        assert_eq!(out.height(), 0);
        assert_eq!(out.width(), 1);
    }
}
