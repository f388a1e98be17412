//! Shared utilities for the cleaning stages.
//!
//! Dtype classification and the text helpers several stages rely on.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type for cleaning purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Signed or unsigned integers
    Integer,
    /// Floating point numbers
    Float,
    /// Date or datetime types
    Temporal,
    /// Boolean type
    Boolean,
    /// String/text type
    String,
    /// Column holding only nulls with no concrete type
    Null,
    /// Other/unknown types
    Other,
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Check if a DataType is a floating point type.
#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_integer_dtype(dtype) || is_float_dtype(dtype)
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    match dtype {
        dtype if is_integer_dtype(dtype) => DtypeCategory::Integer,
        dtype if is_float_dtype(dtype) => DtypeCategory::Float,
        DataType::Date | DataType::Datetime(_, _) => DtypeCategory::Temporal,
        DataType::Boolean => DtypeCategory::Boolean,
        DataType::String => DtypeCategory::String,
        DataType::Null => DtypeCategory::Null,
        _ => DtypeCategory::Other,
    }
}

/// Get the dtype category of a Series.
pub fn series_dtype_category(series: &Series) -> DtypeCategory {
    get_dtype_category(series.dtype())
}

/// Text of the first non-null value of `series`, or an empty string.
///
/// Used to report the offending value when a whole column cannot be
/// converted.
pub fn first_value_text(series: &Series) -> String {
    let Ok(text) = series.cast(&DataType::String) else {
        return String::new();
    };
    let Ok(text) = text.str() else {
        return String::new();
    };
    text.into_iter()
        .flatten()
        .next()
        .map(str::to_string)
        .unwrap_or_default()
}

// =============================================================================
// String Utilities
// =============================================================================

/// Pad `value` on the left with zeros to at least `width` characters.
///
/// A leading `+` or `-` stays in front of the padding. Values already
/// `width` characters or longer are returned unchanged.
///
/// # Example
///
/// ```rust,ignore
/// use metaclean::utils::zero_pad;
///
/// assert_eq!(zero_pad("42", 5), "00042");
/// assert_eq!(zero_pad("-42", 5), "-0042");
/// ```
pub fn zero_pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }

    let padding = "0".repeat(width - len);
    match value.chars().next() {
        Some(sign @ ('+' | '-')) => format!("{sign}{padding}{}", &value[1..]),
        _ => format!("{padding}{value}"),
    }
}

/// Strip any of `chars` from both ends of `value`; whitespace when `None`.
pub fn strip_chars<'a>(value: &'a str, chars: Option<&str>) -> &'a str {
    match chars {
        Some(chars) => value.trim_matches(|c| chars.contains(c)),
        None => value.trim(),
    }
}

// =============================================================================
// Date Utilities
// =============================================================================

/// Day number of 1970-01-01 when 0001-01-01 is day 1.
pub const UNIX_EPOCH_ORDINAL: i64 = 719_163;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a date, or a datetime whose time part is discarded.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|datetime| datetime.date())
        })
}

/// Proleptic Gregorian ordinal of `date`, 0001-01-01 being day 1.
#[inline]
pub fn date_ordinal(date: NaiveDate) -> i64 {
    use chrono::Datelike;
    i64::from(date.num_days_from_ce())
}
