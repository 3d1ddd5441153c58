#![forbid(unsafe_code)]
//! flatops-core: rows, composite keys, delimiters, and ambient configuration.
//!
//! No I/O lives here. The row codec and the sorted-file searcher are in
//! `flatops-io`; the relational engines are in `flatops-operators`.

pub mod config;
pub mod error;
pub mod key;
pub mod row;

pub use error::{Error, Result};
