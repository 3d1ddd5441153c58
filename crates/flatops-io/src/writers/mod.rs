//! Streaming row writers.

pub mod csv;
