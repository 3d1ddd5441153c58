//! Delimited-text row writer.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use ::csv::{Terminator, WriterBuilder};
use flatops_core::config::Delimiter;
use flatops_core::row::RowSink;

use crate::error::{Error, Result};

/// Writes rows with minimal quoting and `\n` line endings.
pub struct CsvRowWriter<W: Write> {
    inner: ::csv::Writer<W>,
}

impl CsvRowWriter<File> {
    pub fn to_path<P: AsRef<Path>>(path: P, delimiter: Delimiter) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f, delimiter))
    }
}

impl<W: Write> CsvRowWriter<W> {
    pub fn to_writer(writer: W, delimiter: Delimiter) -> Self {
        let inner = WriterBuilder::new()
            .delimiter(delimiter.byte())
            .has_headers(false)
            .flexible(true)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(writer);
        Self { inner }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| Error::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))
    }
}

impl<W: Write> RowSink for CsvRowWriter<W> {
    type Error = Error;

    fn write_row(&mut self, row: &[String]) -> Result<()> {
        self.inner.write_record(row)?;
        Ok(())
    }
}
