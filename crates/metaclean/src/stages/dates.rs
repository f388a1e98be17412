//! Date to ordinal conversion.

use super::{coercion_error, require_column};
use crate::error::Result;
use crate::metadata::CleaningPlan;
use crate::pipeline::CleaningStage;
use crate::utils::{UNIX_EPOCH_ORDINAL, date_ordinal, first_value_text, parse_date};
use polars::prelude::*;
use tracing::debug;

const STAGE: CleaningStage = CleaningStage::DateToOrdinal;

/// Replace each flagged date column with its proleptic Gregorian ordinal
/// (0001-01-01 is day 1) as `Int64`.
///
/// Date and datetime columns are converted directly; string columns must
/// hold parseable dates. Missing values stay missing.
pub fn date_to_ordinal(mut df: DataFrame, plan: &CleaningPlan) -> Result<DataFrame> {
    for column in plan.columns_for(STAGE) {
        let series = require_column(&df, STAGE, column)?;
        debug!("Converting {} ({}) to ordinal days", column, series.dtype());
        let ordinals = to_ordinal(column, series)?;
        df.replace(column, ordinals)?;
    }
    Ok(df)
}

fn to_ordinal(column: &str, series: &Series) -> Result<Series> {
    let name = series.name().clone();
    let ordinals: Vec<Option<i64>> = match series.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            let days = series.cast(&DataType::Date)?.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .map(|day| day.map(|day| i64::from(day) + UNIX_EPOCH_ORDINAL))
                .collect()
        }
        DataType::String => series
            .str()?
            .into_iter()
            .map(|value| {
                value
                    .map(|text| {
                        parse_date(text)
                            .map(date_ordinal)
                            .ok_or_else(|| coercion_error(STAGE, column, text))
                    })
                    .transpose()
            })
            .collect::<Result<_>>()?,
        DataType::Null => vec![None; series.len()],
        _ if series.null_count() == series.len() => vec![None; series.len()],
        _ => return Err(coercion_error(STAGE, column, first_value_text(series))),
    };
    Ok(Series::new(name, ordinals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::error::CleaningError;
    use crate::metadata::{Flag, MetadataRow, MetadataTable};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn plan() -> CleaningPlan {
        MetadataTable::from_rows(vec![
            MetadataRow::new("signup_date").with_flag(Flag::DateToOrdinal),
        ])
        .unwrap()
        .compile(&PipelineConfig::default())
        .unwrap()
    }

    fn ordinals(df: &DataFrame) -> Vec<Option<i64>> {
        df.column("signup_date")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_date_column() {
        let dates = [
            Some(NaiveDate::from_ymd_opt(2020, 1, 15).unwrap()),
            None,
            Some(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
        ];
        let df = df!("signup_date" => &dates).unwrap();

        let out = date_to_ordinal(df, &plan()).unwrap();
        assert_eq!(out.column("signup_date").unwrap().dtype(), &DataType::Int64);
        assert_eq!(ordinals(&out), vec![Some(737_439), None, Some(719_163)]);
    }

    #[test]
    fn test_string_column() {
        let df = df!("signup_date" => &[Some("2020-01-15"), None, Some("0001-01-01")]).unwrap();

        let out = date_to_ordinal(df, &plan()).unwrap();
        assert_eq!(ordinals(&out), vec![Some(737_439), None, Some(1)]);
    }

    #[test]
    fn test_unparseable_string() {
        let df = df!("signup_date" => &["2020-01-15", "someday"]).unwrap();

        match date_to_ordinal(df, &plan()) {
            Err(CleaningError::ColumnCoercionError { stage, column, value }) => {
                assert_eq!(stage, CleaningStage::DateToOrdinal);
                assert_eq!(column, "signup_date");
                assert_eq!(value, "someday");
            }
            other => panic!("Expected ColumnCoercionError, got {other:?}"),
        }
    }

    #[test]
    fn test_numeric_column_rejected() {
        let df = df!("signup_date" => &[None, Some(3.5f64)]).unwrap();

        assert!(matches!(
            date_to_ordinal(df, &plan()),
            Err(CleaningError::ColumnCoercionError { ref value, .. }) if value == "3.5"
        ));
    }
}
