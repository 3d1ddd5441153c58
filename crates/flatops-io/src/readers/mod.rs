//! Streaming row readers.

pub mod csv;
