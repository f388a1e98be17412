//! Reporting on cleaned tables.
//!
//! [`describe_table`] builds a per-column description of a table (name,
//! dtype, missing count, basic statistics). [`OutputWriter`] saves the cleaned
//! table, its description and the run summary next to each other.
//!
//! # Example
//!
//! ```rust,ignore
//! use metaclean::reporting::{OutputWriter, describe_table};
//!
//! let mut description = describe_table(&result.table)?;
//! let writer = OutputWriter::new("outputs", None);
//! writer.write_table(&mut result.table)?;
//! writer.write_description(&mut description)?;
//! ```

mod description;
mod writer;

pub use description::{ColumnDescription, describe_columns, describe_table};
pub use writer::{DEFAULT_OUTPUT_NAME, OutputWriter};
