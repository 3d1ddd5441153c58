//! flatops: keyed set operations, group-by aggregation and prefix search over
//! delimited text files.
//!
//! This crate re-exports the workspace members:
//! - [`core`]: rows, composite keys, delimiters
//! - [`io`]: row codec and sorted-file searcher
//! - [`operators`]: join, diff, where filter, group-by

pub use flatops_core as core;
pub use flatops_io as io;
pub use flatops_operators as operators;

