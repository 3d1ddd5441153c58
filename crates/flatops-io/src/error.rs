use thiserror::Error;

/// Result type local to flatops-io.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("input is not sorted: line {line} sorts before the line preceding it")]
    Unsorted { line: u64 },
}
