//! Stages that add or remove whole columns.

use super::require_column;
use crate::error::Result;
use crate::metadata::CleaningPlan;
use crate::pipeline::CleaningStage;
use polars::prelude::*;
use tracing::debug;

/// Suffix of the presence indicator replacing a derived column.
pub const BOOL_SUFFIX: &str = "_bool";

/// Replace each flagged column with a `<name>_bool` presence indicator.
///
/// The indicator is true exactly where the source had a value and takes the
/// source's position.
pub fn derive_to_bool(mut df: DataFrame, plan: &CleaningPlan) -> Result<DataFrame> {
    for column in plan.columns_for(CleaningStage::DeriveToBool) {
        let present = require_column(&df, CleaningStage::DeriveToBool, column)?
            .is_not_null()
            .with_name(format!("{column}{BOOL_SUFFIX}").into())
            .into_series();

        let index = df.get_column_index(column).unwrap_or(df.width());
        df.drop_in_place(column)?;
        df.insert_column(index, present)?;
        debug!("Derived {column}{BOOL_SUFFIX} from {column}");
    }
    Ok(df)
}

/// Remove every column whose `keep_flag` is `0`.
pub fn drop_columns(df: DataFrame, plan: &CleaningPlan) -> Result<DataFrame> {
    let columns = plan.columns_for(CleaningStage::DropColumns);
    if columns.is_empty() {
        return Ok(df);
    }

    for column in &columns {
        require_column(&df, CleaningStage::DropColumns, column)?;
    }
    debug!("Dropping columns {:?}", columns);
    Ok(df.drop_many(columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::error::CleaningError;
    use crate::metadata::{Flag, MetadataRow, MetadataTable};
    use pretty_assertions::assert_eq;

    fn compile(rows: Vec<MetadataRow>) -> CleaningPlan {
        MetadataTable::from_rows(rows)
            .unwrap()
            .compile(&PipelineConfig::default())
            .unwrap()
    }

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    #[test]
    fn test_derive_to_bool_marks_presence() {
        let df = df!(
            "id" => &[1i64, 2, 3],
            "note" => &[Some("late"), None, Some("")],
            "amount" => &[1.0f64, 2.0, 3.0]
        )
        .unwrap();
        let plan = compile(vec![MetadataRow::new("note").with_flag(Flag::DeriveToBool)]);

        let out = derive_to_bool(df, &plan).unwrap();

        assert_eq!(names(&out), vec!["id", "note_bool", "amount"]);
        let flags: Vec<Option<bool>> = out
            .column("note_bool")
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(flags, vec![Some(true), Some(false), Some(true)]);
    }

    #[test]
    fn test_derive_to_bool_missing_column() {
        let df = df!("id" => &[1i64]).unwrap();
        let plan = compile(vec![MetadataRow::new("note").with_flag(Flag::DeriveToBool)]);

        assert!(matches!(
            derive_to_bool(df, &plan),
            Err(CleaningError::MissingReferencedColumn {
                stage: CleaningStage::DeriveToBool,
                ..
            })
        ));
    }

    #[test]
    fn test_drop_columns() {
        let df = df!(
            "id" => &[1i64, 2],
            "name" => &["a", "b"],
            "secret" => &["x", "y"]
        )
        .unwrap();
        let plan = compile(vec![
            MetadataRow::new("id").dropped(),
            MetadataRow::new("name").with(crate::metadata::KEEP_FLAG, "1"),
            MetadataRow::new("secret").dropped(),
        ]);

        let out = drop_columns(df, &plan).unwrap();
        assert_eq!(names(&out), vec!["name"]);
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_drop_columns_missing_column() {
        let df = df!("id" => &[1i64]).unwrap();
        let plan = compile(vec![MetadataRow::new("ghost").dropped()]);

        assert!(matches!(
            drop_columns(df, &plan),
            Err(CleaningError::MissingReferencedColumn {
                stage: CleaningStage::DropColumns,
                ..
            })
        ));
    }
}
