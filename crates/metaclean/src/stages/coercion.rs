//! Strict type coercions.
//!
//! Unlike a lenient cast, a value that cannot be represented in the target
//! type fails the stage with the offending value instead of becoming null.

use super::{coercion_error, require_column};
use crate::error::Result;
use crate::metadata::CleaningPlan;
use crate::pipeline::CleaningStage;
use crate::utils::{DtypeCategory, first_value_text, series_dtype_category};
use polars::prelude::*;
use tracing::debug;

/// Convert each flagged column to its string form.
pub fn float_to_object(df: DataFrame, plan: &CleaningPlan) -> Result<DataFrame> {
    convert_columns(df, plan, CleaningStage::FloatToObject, |_, _, series| {
        Ok(series.cast(&DataType::String)?)
    })
}

/// Convert each flagged string column to `Int64`.
///
/// Text must spell an integer; `"12.5"` is rejected.
pub fn str_to_int(df: DataFrame, plan: &CleaningPlan) -> Result<DataFrame> {
    convert_columns(df, plan, CleaningStage::StrToInt, |stage, column, series| {
        to_int(stage, column, series, parse_integer)
    })
}

/// Convert each flagged column to `Int64`.
///
/// Text holding a float, as left by [`float_to_object`], is truncated.
pub fn object_to_int(df: DataFrame, plan: &CleaningPlan) -> Result<DataFrame> {
    convert_columns(df, plan, CleaningStage::ObjectToInt, |stage, column, series| {
        to_int(stage, column, series, parse_number)
    })
}

/// Convert each flagged column to `Float64`.
pub fn object_to_float(df: DataFrame, plan: &CleaningPlan) -> Result<DataFrame> {
    convert_columns(df, plan, CleaningStage::ObjectToFloat, to_float)
}

/// Convert each flagged column to `Int64`, truncating fractions.
pub fn float_to_int(df: DataFrame, plan: &CleaningPlan) -> Result<DataFrame> {
    convert_columns(df, plan, CleaningStage::FloatToInt, |stage, column, series| {
        to_int(stage, column, series, parse_number)
    })
}

fn convert_columns<F>(
    mut df: DataFrame,
    plan: &CleaningPlan,
    stage: CleaningStage,
    convert: F,
) -> Result<DataFrame>
where
    F: Fn(CleaningStage, &str, &Series) -> Result<Series>,
{
    for column in plan.columns_for(stage) {
        let series = require_column(&df, stage, column)?;
        debug!("{}: converting {} ({})", stage, column, series.dtype());
        let converted = convert(stage, column, series)?;
        df.replace(column, converted)?;
    }
    Ok(df)
}

fn to_int(
    stage: CleaningStage,
    column: &str,
    series: &Series,
    parse: fn(&str) -> Option<i64>,
) -> Result<Series> {
    let values: Vec<Option<i64>> = match series_dtype_category(series) {
        DtypeCategory::Integer => match series.strict_cast(&DataType::Int64) {
            Ok(cast) => cast.i64()?.into_iter().collect(),
            Err(_) => {
                return Err(coercion_error(stage, column, first_overflow(series)?));
            }
        },
        DtypeCategory::Float => series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|value| {
                value
                    .map(|x| float_to_i64(x).ok_or_else(|| coercion_error(stage, column, x.to_string())))
                    .transpose()
            })
            .collect::<Result<_>>()?,
        DtypeCategory::Boolean => series
            .bool()?
            .into_iter()
            .map(|value| value.map(i64::from))
            .collect(),
        DtypeCategory::String => series
            .str()?
            .into_iter()
            .map(|value| {
                value
                    .map(|text| parse(text).ok_or_else(|| coercion_error(stage, column, text)))
                    .transpose()
            })
            .collect::<Result<_>>()?,
        DtypeCategory::Null => vec![None; series.len()],
        DtypeCategory::Temporal | DtypeCategory::Other => {
            return Err(coercion_error(stage, column, first_value_text(series)));
        }
    };
    Ok(Series::new(series.name().clone(), values))
}

fn parse_integer(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

/// Integer text, or float text truncated toward zero.
fn parse_number(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse()
        .ok()
        .or_else(|| text.parse::<f64>().ok().and_then(float_to_i64))
}

/// Text of the first non-null value that does not fit in `Int64`.
fn first_overflow(series: &Series) -> Result<String> {
    let lossy = series.cast(&DataType::Int64)?;
    let lost = &series.is_not_null() & &lossy.is_null();
    Ok(match lost.into_iter().position(|flag| flag == Some(true)) {
        Some(index) => series.get(index)?.to_string(),
        None => first_value_text(series),
    })
}

fn to_float(stage: CleaningStage, column: &str, series: &Series) -> Result<Series> {
    let values: Vec<Option<f64>> = match series_dtype_category(series) {
        DtypeCategory::Integer | DtypeCategory::Float | DtypeCategory::Boolean => series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .collect(),
        DtypeCategory::String => series
            .str()?
            .into_iter()
            .map(|value| {
                value
                    .map(|text| {
                        text.trim()
                            .parse::<f64>()
                            .map_err(|_| coercion_error(stage, column, text))
                    })
                    .transpose()
            })
            .collect::<Result<_>>()?,
        DtypeCategory::Null => vec![None; series.len()],
        DtypeCategory::Temporal | DtypeCategory::Other => {
            return Err(coercion_error(stage, column, first_value_text(series)));
        }
    };
    Ok(Series::new(series.name().clone(), values))
}

/// Truncate toward zero; `None` for non-finite or out-of-range values.
fn float_to_i64(value: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (value.is_finite() && value.trunc() < LIMIT && value.trunc() >= -LIMIT)
        .then(|| value.trunc() as i64)
}
