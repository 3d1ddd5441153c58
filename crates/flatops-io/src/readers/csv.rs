//! Delimited-text row reader.
//!
//! Fields follow the usual CSV quoting convention (`"a,b"`, `""` for a literal
//! quote). Rows may have differing field counts; nothing is treated as a header.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ::csv::{ReaderBuilder, StringRecord};
use flatops_core::config::Delimiter;
use flatops_core::row::Row;

use crate::error::Result;

pub struct CsvRowReader<R: Read> {
    inner: ::csv::Reader<R>,
    record: StringRecord,
}

impl CsvRowReader<File> {
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: Delimiter) -> Result<Self> {
        let f = File::open(path)?;
        Ok(Self::from_reader(f, delimiter))
    }
}

impl<R: Read> CsvRowReader<R> {
    pub fn from_reader(reader: R, delimiter: Delimiter) -> Self {
        let inner = ReaderBuilder::new()
            .delimiter(delimiter.byte())
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        Self {
            inner,
            record: StringRecord::new(),
        }
    }

    /// Decode the next row, or `None` at end of input.
    pub fn read_row(&mut self) -> Result<Option<Row>> {
        if !self.inner.read_record(&mut self.record)? {
            return Ok(None);
        }
        Ok(Some(self.record.iter().map(str::to_owned).collect()))
    }
}

impl<R: Read> Iterator for CsvRowReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_row().transpose()
    }
}
