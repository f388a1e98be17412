//! Stages that rewrite string values.

use super::{coercion_error, require_column};
use crate::error::Result;
use crate::metadata::{CleaningPlan, ColumnRule, RegexReplacement};
use crate::pipeline::CleaningStage;
use crate::utils::{DtypeCategory, first_value_text, series_dtype_category, strip_chars, zero_pad};
use polars::prelude::*;
use tracing::debug;

/// Map every non-null value of a string series through `f`.
fn map_strings<F>(series: &Series, mut f: F) -> Result<Series>
where
    F: FnMut(&str) -> String,
{
    let values: Vec<Option<String>> = series
        .str()?
        .into_iter()
        .map(|value| value.map(&mut f))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

/// Strip characters from both ends of the values of each flagged column.
///
/// `chars_to_strip` lists the characters to remove; without it whitespace is
/// stripped. A column holding only nulls is left as-is; any other non-string
/// column fails with [`CleaningError::ColumnCoercionError`].
///
/// [`CleaningError::ColumnCoercionError`]: crate::error::CleaningError::ColumnCoercionError
pub fn strip(mut df: DataFrame, plan: &CleaningPlan) -> Result<DataFrame> {
    for (column, rule) in plan.rules_for(CleaningStage::Strip) {
        let ColumnRule::Strip { chars } = rule else {
            continue;
        };
        let series = require_column(&df, CleaningStage::Strip, column)?;
        match series_dtype_category(series) {
            DtypeCategory::String => {}
            DtypeCategory::Null => continue,
            _ => {
                return Err(coercion_error(
                    CleaningStage::Strip,
                    column,
                    first_value_text(series),
                ));
            }
        }

        debug!("Stripping {:?} from {}", chars, column);
        let stripped = map_strings(series, |value| {
            strip_chars(value, chars.as_deref()).to_string()
        })?;
        df.replace(column, stripped)?;
    }
    Ok(df)
}

/// Left-pad the string form of each flagged column with zeros to width `z`.
///
/// Numeric columns are converted to their string form first. Missing values
/// stay missing.
pub fn zero_fill(mut df: DataFrame, plan: &CleaningPlan) -> Result<DataFrame> {
    for (column, rule) in plan.rules_for(CleaningStage::ZeroFill) {
        let ColumnRule::ZeroFill { width } = rule else {
            continue;
        };
        let series = require_column(&df, CleaningStage::ZeroFill, column)?;
        let text = series.cast(&DataType::String)?;

        debug!("Zero-filling {} to width {}", column, width);
        let padded = map_strings(&text, |value| zero_pad(value, *width))?;
        df.replace(column, padded)?;
    }
    Ok(df)
}

/// Apply every regex group to its columns.
///
/// Each column receives its group's replacements in order, every pattern
/// replacing all of its matches. Non-string columns are left untouched.
pub fn regex_replace(mut df: DataFrame, plan: &CleaningPlan) -> Result<DataFrame> {
    for group in plan.regex_groups() {
        for (column, replacements) in group.targets() {
            let series = require_column(&df, CleaningStage::RegexReplace, column)?;
            if replacements.is_empty() {
                continue;
            }
            if series.dtype() != &DataType::String {
                debug!(
                    "Skipping regex group '{}' on non-string column '{}'",
                    group.name(),
                    column
                );
                continue;
            }

            debug!(
                "Applying {} replacements of group '{}' to {}",
                replacements.len(),
                group.name(),
                column
            );
            let replaced = map_strings(series, |value| apply_all(replacements, value))?;
            df.replace(column, replaced)?;
        }
    }
    Ok(df)
}

fn apply_all(replacements: &[RegexReplacement], value: &str) -> String {
    replacements
        .iter()
        .fold(value.to_string(), |current, replacement| {
            replacement.apply(&current).into_owned()
        })
}

/// Remove `,` from every string column.
///
/// Not part of the fixed stage sequence; useful before numeric coercion of
/// values written with thousands separators.
pub fn remove_commas(mut df: DataFrame) -> Result<DataFrame> {
    let string_columns: Vec<PlSmallStr> = df
        .get_columns()
        .iter()
        .filter(|column| column.dtype() == &DataType::String)
        .map(|column| column.name().clone())
        .collect();

    for name in string_columns {
        let series = df.column(name.as_str())?.as_materialized_series();
        let cleaned = map_strings(series, |value| value.replace(',', ""))?;
        df.replace(name.as_str(), cleaned)?;
    }
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::error::CleaningError;
    use crate::metadata::{Flag, MetadataRow, MetadataTable, Param};
    use pretty_assertions::assert_eq;

    fn compile(rows: Vec<MetadataRow>) -> CleaningPlan {
        MetadataTable::from_rows(rows)
            .unwrap()
            .compile(&PipelineConfig::default())
            .unwrap()
    }

    fn strings(df: &DataFrame, column: &str) -> Vec<Option<String>> {
        df.column(column)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|value| value.map(str::to_string))
            .collect()
    }

    fn some(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|value| Some(value.to_string())).collect()
    }

    #[test]
    fn test_strip_given_chars() {
        let df = df!("price" => &[Some("$12.50$"), None, Some("7")]).unwrap();
        let plan = compile(vec![
            MetadataRow::new("price")
                .with_flag(Flag::StripChars)
                .with_param(Param::CharsToStrip, "$"),
        ]);

        let out = strip(df, &plan).unwrap();
        assert_eq!(
            strings(&out, "price"),
            vec![Some("12.50".to_string()), None, Some("7".to_string())]
        );
    }

    #[test]
    fn test_strip_defaults_to_whitespace() {
        let df = df!("name" => &["  ada ", "bob"]).unwrap();
        let plan = compile(vec![MetadataRow::new("name").with_flag(Flag::StripChars)]);

        let out = strip(df, &plan).unwrap();
        assert_eq!(strings(&out, "name"), some(&["ada", "bob"]));
    }

    #[test]
    fn test_strip_rejects_non_string_column() {
        let df = df!("n" => &[1i64, 2]).unwrap();
        let plan = compile(vec![
            MetadataRow::new("n")
                .with_flag(Flag::StripChars)
                .with_param(Param::CharsToStrip, "1"),
        ]);

        match strip(df, &plan) {
            Err(CleaningError::ColumnCoercionError { stage, column, value }) => {
                assert_eq!(stage, CleaningStage::Strip);
                assert_eq!(column, "n");
                assert_eq!(value, "1");
            }
            other => panic!("Expected ColumnCoercionError, got {other:?}"),
        }
    }

    #[test]
    fn test_strip_leaves_all_null_column() {
        let df = DataFrame::new(vec![Column::full_null("n".into(), 2, &DataType::Null)]).unwrap();
        let plan = compile(vec![MetadataRow::new("n").with_flag(Flag::StripChars)]);

        let out = strip(df.clone(), &plan).unwrap();
        assert!(out.equals_missing(&df));
    }

    #[test]
    fn test_zero_fill_strings() {
        let df = df!("zip" => &[Some("501"), Some("12345"), None, Some("-7")]).unwrap();
        let plan = compile(vec![
            MetadataRow::new("zip")
                .with_flag(Flag::ZfillCol)
                .with_param(Param::Z, "5"),
        ]);

        let out = zero_fill(df, &plan).unwrap();
        assert_eq!(
            strings(&out, "zip"),
            vec![
                Some("00501".to_string()),
                Some("12345".to_string()),
                None,
                Some("-0007".to_string()),
            ]
        );
    }

    #[test]
    fn test_zero_fill_numbers_reach_width() {
        let df = df!("code" => &[1i64, 42, 123_456]).unwrap();
        let plan = compile(vec![
            MetadataRow::new("code")
                .with_flag(Flag::ZfillCol)
                .with_param(Param::Z, "4"),
        ]);

        let out = zero_fill(df, &plan).unwrap();
        let values = strings(&out, "code");
        assert!(values.iter().flatten().all(|value| value.chars().count() >= 4));
        assert_eq!(values, some(&["0001", "0042", "123456"]));
    }

    #[test]
    fn test_regex_replace_applies_group_union_to_every_column() {
        let df = df!(
            "A" => &["x-p", "q"],
            "B" => &["xq", "zzz"]
        )
        .unwrap();
        let plan = compile(vec![
            MetadataRow::new("A")
                .in_regex_group("g1")
                .with_param(Param::Regex, "x")
                .with_param(Param::RegexReplace, "y"),
            MetadataRow::new("B")
                .in_regex_group("g1")
                .with_param(Param::Regex, "p | q")
                .with_param(Param::RegexReplace, "r | s"),
        ]);

        let out = regex_replace(df, &plan).unwrap();
        assert_eq!(strings(&out, "A"), some(&["y-r", "s"]));
        assert_eq!(strings(&out, "B"), some(&["ys", "zzz"]));
    }

    #[test]
    fn test_regex_replace_is_sequential() {
        let df = df!("phone" => &["(555) 123-4567"]).unwrap();
        let plan = compile(vec![
            MetadataRow::new("phone")
                .in_regex_group("digits")
                .with_param(Param::Regex, r"[()\s-] | ^(\d{3})(\d{3})(\d{4})$")
                .with_param(Param::RegexReplace, r" | \1.\2.\3"),
        ]);

        let out = regex_replace(df, &plan).unwrap();
        assert_eq!(strings(&out, "phone"), some(&["555.123.4567"]));
    }

    #[test]
    fn test_regex_replace_skips_non_string_columns() {
        let df = df!("n" => &[10i64, 20]).unwrap();
        let plan = compile(vec![
            MetadataRow::new("n")
                .in_regex_group("g")
                .with_param(Param::Regex, "1")
                .with_param(Param::RegexReplace, "2"),
        ]);

        let out = regex_replace(df.clone(), &plan).unwrap();
        assert!(out.equals(&df));
    }

    #[test]
    fn test_regex_replace_reports_missing_column_without_patterns() {
        let df = df!("phone" => &["555"]).unwrap();
        let plan = compile(vec![MetadataRow::new("ghost").in_regex_group("g")]);

        match regex_replace(df, &plan) {
            Err(CleaningError::MissingReferencedColumn { stage, column }) => {
                assert_eq!(stage, CleaningStage::RegexReplace);
                assert_eq!(column, "ghost");
            }
            other => panic!("Expected MissingReferencedColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_remove_commas() {
        let df = df!(
            "amount" => &[Some("1,234"), None],
            "n" => &[Some(1i64), Some(2)]
        )
        .unwrap();

        let out = remove_commas(df).unwrap();
        assert_eq!(strings(&out, "amount"), vec![Some("1234".to_string()), None]);
        assert_eq!(out.column("n").unwrap().dtype(), &DataType::Int64);
    }
}
