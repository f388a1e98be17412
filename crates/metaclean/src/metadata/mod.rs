//! Metadata table access.
//!
//! The metadata table holds one row per source column. Flags are text cells
//! that count as set only when they hold exactly `"1"`; `keep_flag` is the
//! exception and drops its column when it holds `"0"`.

mod plan;

pub use plan::{CleaningPlan, ColumnRule, FillLiteral, RegexGroup, RegexReplacement};

use crate::config::PipelineConfig;
use crate::error::{CleaningError, Result};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Name of the key column of the metadata table.
pub const COLUMN_NAME: &str = "column_name";
/// Name of the column-retention flag.
pub const KEEP_FLAG: &str = "keep_flag";
/// Name of the regex group attribute.
pub const REGEX_GROUP: &str = "regex_group";

const FLAG_SET: &str = "1";
const KEEP_FLAG_DROP: &str = "0";
const NO_REGEX_GROUP: &str = "0";

/// Boolean attributes selecting which columns a stage acts upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    DropRowsWithNa,
    DeriveToBool,
    StripChars,
    DateToOrdinal,
    FloatToObject,
    ZfillCol,
    FillNa,
    StrToInt,
    ObjectToInt,
    ObjectToFloat,
    FloatToInt,
}

impl Flag {
    /// Every flag, in the order their stages run.
    pub const ALL: [Flag; 11] = [
        Flag::DropRowsWithNa,
        Flag::DeriveToBool,
        Flag::StripChars,
        Flag::DateToOrdinal,
        Flag::FloatToObject,
        Flag::ZfillCol,
        Flag::FillNa,
        Flag::StrToInt,
        Flag::ObjectToInt,
        Flag::ObjectToFloat,
        Flag::FloatToInt,
    ];

    /// The metadata column holding this flag.
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::DropRowsWithNa => "drop_rows_with_na",
            Self::DeriveToBool => "derive_to_bool",
            Self::StripChars => "strip_chars",
            Self::DateToOrdinal => "date_to_ordinal",
            Self::FloatToObject => "float_to_object",
            Self::ZfillCol => "zfill_col",
            Self::FillNa => "fill_na",
            Self::StrToInt => "str_to_int",
            Self::ObjectToInt => "object_to_int",
            Self::ObjectToFloat => "object_to_float",
            Self::FloatToInt => "float_to_int",
        }
    }
}

/// Scalar attributes parameterizing a flagged column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    CharsToStrip,
    Z,
    FillNaWith,
    Regex,
    RegexReplace,
}

impl Param {
    /// The metadata column holding this parameter.
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::CharsToStrip => "chars_to_strip",
            Self::Z => "z",
            Self::FillNaWith => "fill_na_with",
            Self::Regex => "regex",
            Self::RegexReplace => "regex_replace",
        }
    }
}

/// One metadata row: the directives for a single source column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    column_name: String,
    attributes: HashMap<String, String>,
}

impl MetadataRow {
    /// Create a row for `column_name` with no attributes set.
    pub fn new(column_name: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Set an attribute cell.
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    /// Set a flag to `"1"`.
    pub fn with_flag(self, flag: Flag) -> Self {
        self.with(flag.column_name(), FLAG_SET)
    }

    /// Set a parameter cell.
    pub fn with_param(self, param: Param, value: impl Into<String>) -> Self {
        self.with(param.column_name(), value)
    }

    /// Mark the column for removal (`keep_flag = "0"`).
    pub fn dropped(self) -> Self {
        self.with(KEEP_FLAG, KEEP_FLAG_DROP)
    }

    /// Put the column in a regex group.
    pub fn in_regex_group(self, group: impl Into<String>) -> Self {
        self.with(REGEX_GROUP, group)
    }

    /// The column this row governs.
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// Raw attribute cell, if present.
    pub fn attribute(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).map(String::as_str)
    }

    /// Whether `flag` is set on this row.
    pub fn is_set(&self, flag: Flag) -> bool {
        self.attribute(flag.column_name()) == Some(FLAG_SET)
    }

    /// Whether this row asks for its column to be dropped.
    pub fn is_dropped(&self) -> bool {
        self.attribute(KEEP_FLAG) == Some(KEEP_FLAG_DROP)
    }

    /// The regex group of this row, `None` when unset or `"0"`.
    pub fn regex_group(&self) -> Option<&str> {
        self.attribute(REGEX_GROUP)
            .map(str::trim)
            .filter(|group| !group.is_empty() && *group != NO_REGEX_GROUP)
    }

    /// Parameter cell, if present and non-empty.
    pub fn param(&self, param: Param) -> Option<&str> {
        self.attribute(param.column_name())
            .filter(|value| !value.is_empty())
    }
}

/// Read-only table of per-column cleaning directives.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    rows: Vec<MetadataRow>,
}

impl MetadataTable {
    /// Build a metadata table from in-memory rows.
    ///
    /// # Errors
    ///
    /// Returns [`CleaningError::DuplicateColumnMetadata`] when two rows govern
    /// the same column.
    pub fn from_rows(rows: impl IntoIterator<Item = MetadataRow>) -> Result<Self> {
        let rows: Vec<MetadataRow> = rows.into_iter().collect();
        let mut seen = HashSet::new();
        for row in &rows {
            if !seen.insert(row.column_name.as_str()) {
                return Err(CleaningError::DuplicateColumnMetadata(
                    row.column_name.clone(),
                ));
            }
        }
        Ok(Self { rows })
    }

    /// Build a metadata table from a DataFrame whose columns are attribute names.
    ///
    /// Every cell is read as text; nulls leave the attribute unset.
    ///
    /// # Errors
    ///
    /// Fails with [`CleaningError::InvalidMetadata`] when there is no
    /// `column_name` column or a row has an empty column name, and with
    /// [`CleaningError::DuplicateColumnMetadata`] on repeated names.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let names = df
            .column(COLUMN_NAME)
            .map_err(|_| {
                CleaningError::InvalidMetadata(format!(
                    "metadata table has no '{COLUMN_NAME}' column"
                ))
            })?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let names = names.str()?;

        let mut rows = Vec::with_capacity(df.height());
        for (index, name) in names.into_iter().enumerate() {
            let name = name.map(str::trim).unwrap_or_default();
            if name.is_empty() {
                return Err(CleaningError::InvalidMetadata(format!(
                    "metadata row {index} has an empty '{COLUMN_NAME}'"
                )));
            }
            rows.push(MetadataRow::new(name));
        }

        for column in df.get_columns() {
            let attribute = column.name().to_string();
            if attribute == COLUMN_NAME {
                continue;
            }
            let values = column.as_materialized_series().cast(&DataType::String)?;
            for (row, value) in rows.iter_mut().zip(values.str()?.into_iter()) {
                if let Some(value) = value {
                    row.attributes
                        .insert(attribute.clone(), value.trim().to_string());
                }
            }
        }

        debug!("Loaded metadata for {} columns", rows.len());
        Self::from_rows(rows)
    }

    /// All rows, in table order.
    pub fn rows(&self) -> &[MetadataRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row governing `column`, if any.
    pub fn row(&self, column: &str) -> Option<&MetadataRow> {
        self.rows.iter().find(|row| row.column_name == column)
    }

    /// Names of the columns for which `flag` is set. Empty when no row sets it.
    pub fn columns_with_flag(&self, flag: Flag) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|row| row.is_set(flag))
            .map(MetadataRow::column_name)
            .collect()
    }

    /// Names of the columns whose `keep_flag` is `"0"`.
    pub fn columns_to_drop(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|row| row.is_dropped())
            .map(MetadataRow::column_name)
            .collect()
    }

    /// Scalar parameter of `column`.
    ///
    /// Only meaningful once the flag owning `param` is known to be set.
    pub fn param(&self, column: &str, param: Param) -> Option<&str> {
        self.row(column).and_then(|row| row.param(param))
    }

    /// Distinct non-zero regex groups, in first-seen order.
    pub fn regex_groups(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(MetadataRow::regex_group)
            .filter(|group| seen.insert(*group))
            .collect()
    }

    /// Rows belonging to `group`.
    pub fn rows_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a MetadataRow> {
        self.rows
            .iter()
            .filter(move |row| row.regex_group() == Some(group))
    }

    /// Compile the table into typed rules.
    ///
    /// # Errors
    ///
    /// Fails on any parameter a set flag needs but cannot use: a missing or
    /// non-integer `z`, an unrecognized fill literal, a regex that does not
    /// compile or pattern/replacement lists of different lengths.
    pub fn compile(&self, config: &PipelineConfig) -> Result<CleaningPlan> {
        CleaningPlan::compile(self, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> MetadataTable {
        MetadataTable::from_rows(vec![
            MetadataRow::new("id").dropped(),
            MetadataRow::new("note").with_flag(Flag::DeriveToBool),
            MetadataRow::new("zip")
                .with_flag(Flag::ZfillCol)
                .with_param(Param::Z, "5"),
            MetadataRow::new("amount").with(KEEP_FLAG, "1"),
        ])
        .unwrap()
    }

    #[test]
    fn test_columns_with_flag() {
        let table = sample_table();
        assert_eq!(table.columns_with_flag(Flag::DeriveToBool), vec!["note"]);
        assert_eq!(table.columns_with_flag(Flag::ZfillCol), vec!["zip"]);
    }

    #[test]
    fn test_unset_flag_yields_empty_list() {
        let table = sample_table();
        assert!(table.columns_with_flag(Flag::FloatToInt).is_empty());
    }

    #[test]
    fn test_only_literal_one_sets_a_flag() {
        let table = MetadataTable::from_rows(vec![
            MetadataRow::new("a").with(Flag::StrToInt.column_name(), "true"),
            MetadataRow::new("b").with(Flag::StrToInt.column_name(), "1.0"),
            MetadataRow::new("c").with(Flag::StrToInt.column_name(), "1"),
        ])
        .unwrap();
        assert_eq!(table.columns_with_flag(Flag::StrToInt), vec!["c"]);
    }

    #[test]
    fn test_columns_to_drop() {
        let table = sample_table();
        assert_eq!(table.columns_to_drop(), vec!["id"]);
    }

    #[test]
    fn test_param_lookup() {
        let table = sample_table();
        assert_eq!(table.param("zip", Param::Z), Some("5"));
        assert_eq!(table.param("note", Param::Z), None);
        assert_eq!(table.param("unknown", Param::Z), None);
    }

    #[test]
    fn test_duplicate_column_metadata() {
        let result = MetadataTable::from_rows(vec![
            MetadataRow::new("amount"),
            MetadataRow::new("amount").dropped(),
        ]);
        assert!(matches!(
            result,
            Err(CleaningError::DuplicateColumnMetadata(ref column)) if column == "amount"
        ));
    }

    #[test]
    fn test_regex_groups_skip_zero_and_blank() {
        let table = MetadataTable::from_rows(vec![
            MetadataRow::new("a").in_regex_group("g1"),
            MetadataRow::new("b").in_regex_group("0"),
            MetadataRow::new("c").in_regex_group(""),
            MetadataRow::new("d").in_regex_group("g2"),
            MetadataRow::new("e").in_regex_group("g1"),
        ])
        .unwrap();
        assert_eq!(table.regex_groups(), vec!["g1", "g2"]);
        let members: Vec<&str> = table
            .rows_in_group("g1")
            .map(MetadataRow::column_name)
            .collect();
        assert_eq!(members, vec!["a", "e"]);
    }

    #[test]
    fn test_from_dataframe() {
        let df = df!(
            "column_name" => &["id", "amount"],
            "keep_flag" => &[Some("0"), Some("1")],
            "object_to_float" => &[None, Some("1")]
        )
        .unwrap();

        let table = MetadataTable::from_dataframe(&df).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns_to_drop(), vec!["id"]);
        assert_eq!(table.columns_with_flag(Flag::ObjectToFloat), vec!["amount"]);
        assert_eq!(table.row("id").unwrap().attribute("object_to_float"), None);
    }

    #[test]
    fn test_from_dataframe_casts_numeric_flags() {
        let df = df!(
            "column_name" => &["score"],
            "float_to_int" => &[1i64]
        )
        .unwrap();

        let table = MetadataTable::from_dataframe(&df).unwrap();
        assert_eq!(table.columns_with_flag(Flag::FloatToInt), vec!["score"]);
    }

    #[test]
    fn test_from_dataframe_requires_column_name() {
        let df = df!("keep_flag" => &["1"]).unwrap();
        assert!(matches!(
            MetadataTable::from_dataframe(&df),
            Err(CleaningError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn test_from_dataframe_detects_duplicates() {
        let df = df!("column_name" => &["a", "b", "a"]).unwrap();
        assert!(matches!(
            MetadataTable::from_dataframe(&df),
            Err(CleaningError::DuplicateColumnMetadata(_))
        ));
    }
}
