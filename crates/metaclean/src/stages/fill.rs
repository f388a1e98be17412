//! Missing value filling.

use super::{coercion_error, require_column};
use crate::error::Result;
use crate::metadata::{CleaningPlan, ColumnRule, FillLiteral};
use crate::pipeline::CleaningStage;
use crate::utils::{DtypeCategory, series_dtype_category};
use polars::prelude::*;
use tracing::debug;

const STAGE: CleaningStage = CleaningStage::FillMissing;

/// Fill the missing values of each flagged column with its literal.
///
/// The literal is converted to the column's dtype: booleans take
/// `TRUE`/`FALSE` (and `0` as false), numeric columns take `0`, or `1` for
/// `TRUE`, and string columns take the literal text. An all-null column
/// without a concrete type becomes Boolean or Int64 to match the literal.
pub fn fill_missing(mut df: DataFrame, plan: &CleaningPlan) -> Result<DataFrame> {
    for (column, rule) in plan.rules_for(STAGE) {
        let ColumnRule::FillMissing(literal) = rule else {
            continue;
        };
        let series = require_column(&df, STAGE, column)?;
        if series.null_count() == 0 {
            continue;
        }

        debug!(
            "Filling {} missing values of {} with {}",
            series.null_count(),
            column,
            literal.as_text()
        );
        let filled = fill_series(column, series, *literal)?;
        df.replace(column, filled)?;
    }
    Ok(df)
}

fn fill_series(column: &str, series: &Series, literal: FillLiteral) -> Result<Series> {
    match series_dtype_category(series) {
        DtypeCategory::Boolean => {
            let fill = matches!(literal, FillLiteral::Bool(true));
            let values: Vec<Option<bool>> = series
                .bool()?
                .into_iter()
                .map(|value| Some(value.unwrap_or(fill)))
                .collect();
            Ok(Series::new(series.name().clone(), values))
        }
        DtypeCategory::Integer | DtypeCategory::Float => {
            let strategy = match literal {
                FillLiteral::Bool(true) => FillNullStrategy::One,
                FillLiteral::Bool(false) | FillLiteral::Zero => FillNullStrategy::Zero,
            };
            Ok(series.fill_null(strategy)?)
        }
        DtypeCategory::String => {
            let values: Vec<Option<String>> = series
                .str()?
                .into_iter()
                .map(|value| Some(value.unwrap_or(literal.as_text()).to_string()))
                .collect();
            Ok(Series::new(series.name().clone(), values))
        }
        DtypeCategory::Null => {
            let target = match literal {
                FillLiteral::Bool(_) => DataType::Boolean,
                FillLiteral::Zero => DataType::Int64,
            };
            fill_series(column, &series.cast(&target)?, literal)
        }
        DtypeCategory::Temporal | DtypeCategory::Other => {
            Err(coercion_error(STAGE, column, literal.as_text()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::error::CleaningError;
    use crate::metadata::{Flag, MetadataRow, MetadataTable, Param};
    use pretty_assertions::assert_eq;

    fn plan(column: &str, literal: &str) -> CleaningPlan {
        MetadataTable::from_rows(vec![
            MetadataRow::new(column)
                .with_flag(Flag::FillNa)
                .with_param(Param::FillNaWith, literal),
        ])
        .unwrap()
        .compile(&PipelineConfig::default())
        .unwrap()
    }

    #[test]
    fn test_fill_boolean() {
        let df = df!("active" => &[Some(true), None, Some(false)]).unwrap();
        let out = fill_missing(df, &plan("active", "TRUE")).unwrap();
        let values: Vec<Option<bool>> =
            out.column("active").unwrap().bool().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(true), Some(true), Some(false)]);
    }

    #[test]
    fn test_fill_numeric_with_zero() {
        let df = df!("amount" => &[Some(1.5f64), None]).unwrap();
        let out = fill_missing(df, &plan("amount", "0")).unwrap();
        let values: Vec<Option<f64>> =
            out.column("amount").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1.5), Some(0.0)]);
    }

    #[test]
    fn test_fill_integer_with_true() {
        let df = df!("count" => &[None, Some(4i64)]).unwrap();
        let out = fill_missing(df, &plan("count", "TRUE")).unwrap();
        let values: Vec<Option<i64>> =
            out.column("count").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1), Some(4)]);
    }

    #[test]
    fn test_fill_string_with_literal_text() {
        let df = df!("flag" => &[Some("Y"), None]).unwrap();
        let out = fill_missing(df, &plan("flag", "FALSE")).unwrap();
        let values: Vec<Option<&str>> =
            out.column("flag").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("Y"), Some("FALSE")]);
    }

    #[test]
    fn test_fill_all_null_column() {
        let df = DataFrame::new(vec![Column::full_null("empty".into(), 2, &DataType::Null)]).unwrap();
        let out = fill_missing(df, &plan("empty", "FALSE")).unwrap();
        let column = out.column("empty").unwrap();
        assert_eq!(column.dtype(), &DataType::Boolean);
        assert_eq!(column.null_count(), 0);
    }

    #[test]
    fn test_fill_temporal_column_rejected() {
        let dates = [None, Some(chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())];
        let df = df!("day" => &dates).unwrap();
        assert!(matches!(
            fill_missing(df, &plan("day", "0")),
            Err(CleaningError::ColumnCoercionError { ref value, .. }) if value == "0"
        ));
    }
}
