#![forbid(unsafe_code)]
//! flatops-io: the delimited row codec and the sorted-file searcher.
//!
//! Readers decode CSV-style records (standard double-quote escaping, ragged
//! rows allowed, no header handling) into `Row`s; writers encode them back.
//! Everything here is synchronous and blocking.

pub mod error;
pub mod readers;
pub mod searcher;
pub mod writers;

pub use error::{Error, Result};
pub use readers::csv::CsvRowReader;
pub use searcher::SortedFileSearcher;
pub use writers::csv::CsvRowWriter;
