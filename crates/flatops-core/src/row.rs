//! Rows as decoded by the row codec, plus the output seam engines write into.
//!
//! A row is an ordered sequence of string fields with no fixed schema; files
//! may be ragged, so every column access is bounds-checked.

use std::convert::Infallible;

use crate::error::{Error, Result};

/// One decoded record. Owned per call; engines never share rows across runs.
pub type Row = Vec<String>;

/// Borrow the field at `index`, failing with `MissingColumn` on short rows.
pub fn field(row: &[String], index: usize) -> Result<&str> {
    row.get(index)
        .map(String::as_str)
        .ok_or(Error::MissingColumn {
            index,
            len: row.len(),
        })
}

/// Copy the fields at `columns` (in the given order) out of `row`.
pub fn project(row: &[String], columns: &[usize]) -> Result<Vec<String>> {
    columns
        .iter()
        .map(|&c| field(row, c).map(str::to_owned))
        .collect()
}

/// Destination for emitted rows.
///
/// Implemented by the CSV writer in `flatops-io` and by `Vec<Row>` for
/// in-memory collection.
pub trait RowSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn write_row(&mut self, row: &[String]) -> std::result::Result<(), Self::Error>;
}

impl RowSink for Vec<Row> {
    type Error = Infallible;

    fn write_row(&mut self, row: &[String]) -> std::result::Result<(), Infallible> {
        self.push(row.to_vec());
        Ok(())
    }
}

impl<S: RowSink + ?Sized> RowSink for &mut S {
    type Error = S::Error;

    fn write_row(&mut self, row: &[String]) -> std::result::Result<(), Self::Error> {
        (**self).write_row(row)
    }
}
