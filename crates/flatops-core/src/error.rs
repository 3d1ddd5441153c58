use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Key specification must name at least one column")]
    EmptyKey,

    // Ragged input: the row ended before the referenced column.
    #[error("Column {index} out of range for row with {len} fields")]
    MissingColumn { index: usize, len: usize },

    #[error("Invalid column reference '{0}': expected a 0-based integer")]
    InvalidColumn(String),

    #[error("Invalid delimiter '{0}': expected a single ASCII character, '\\t' or 'tab'")]
    InvalidDelimiter(String),
}
