//! The thirteen transformation stages.
//!
//! Every stage takes the table by value together with the compiled
//! [`CleaningPlan`] and returns the transformed table. A stage only touches
//! the columns its rules name; when no rule targets it the table is returned
//! as-is.
//!
//! The stages are run in [`CleaningStage::PIPELINE_ORDER`] by [`apply`]. They
//! are also public so a caller can run a single stage in isolation.

mod coercion;
mod columns;
mod dates;
mod fill;
mod rows;
mod text;

pub use coercion::{float_to_int, float_to_object, object_to_float, object_to_int, str_to_int};
pub use columns::{derive_to_bool, drop_columns};
pub use dates::date_to_ordinal;
pub use fill::fill_missing;
pub use rows::drop_rows_with_na;
pub use text::{regex_replace, remove_commas, strip, zero_fill};

use crate::error::{CleaningError, Result};
use crate::metadata::CleaningPlan;
use crate::pipeline::CleaningStage;
use polars::prelude::*;

/// Run `stage` over `df`.
///
/// Non-transformation stages (`Initializing` and the terminal states)
/// return the table unchanged.
pub fn apply(stage: CleaningStage, df: DataFrame, plan: &CleaningPlan) -> Result<DataFrame> {
    match stage {
        CleaningStage::DropRowsWithNa => drop_rows_with_na(df, plan),
        CleaningStage::DeriveToBool => derive_to_bool(df, plan),
        CleaningStage::DropColumns => drop_columns(df, plan),
        CleaningStage::Strip => strip(df, plan),
        CleaningStage::DateToOrdinal => date_to_ordinal(df, plan),
        CleaningStage::FloatToObject => float_to_object(df, plan),
        CleaningStage::ZeroFill => zero_fill(df, plan),
        CleaningStage::FillMissing => fill_missing(df, plan),
        CleaningStage::RegexReplace => regex_replace(df, plan),
        CleaningStage::StrToInt => str_to_int(df, plan),
        CleaningStage::ObjectToInt => object_to_int(df, plan),
        CleaningStage::ObjectToFloat => object_to_float(df, plan),
        CleaningStage::FloatToInt => float_to_int(df, plan),
        CleaningStage::Initializing
        | CleaningStage::Complete
        | CleaningStage::Cancelled
        | CleaningStage::Failed => Ok(df),
    }
}

/// Look up a column named by the metadata.
fn require_column<'a>(
    df: &'a DataFrame,
    stage: CleaningStage,
    column: &str,
) -> Result<&'a Series> {
    df.column(column)
        .map(Column::as_materialized_series)
        .map_err(|_| CleaningError::MissingReferencedColumn {
            stage,
            column: column.to_string(),
        })
}

fn coercion_error(stage: CleaningStage, column: &str, value: impl Into<String>) -> CleaningError {
    CleaningError::ColumnCoercionError {
        stage,
        column: column.to_string(),
        value: value.into(),
    }
}
