//! Operator trait + common interfaces.
//!
//! Engines read rows from any iterator of `Result<Row, E>` (the CSV reader in
//! `flatops-io`, or an in-memory `Vec`) and write to a `RowSink`. Source and
//! sink errors are boxed into `OpError` so engines stay independent of the codec.

use std::convert::Infallible;

use flatops_core::key::KeySpec;
use flatops_core::row::{Row, RowSink};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::OpStats;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] flatops_core::Error),

    #[error("non-numeric value {value:?} in aggregate column {column}")]
    NonNumeric { column: usize, value: String },

    #[error("input error: {0}")]
    Input(#[source] BoxError),

    #[error("output error: {0}")]
    Output(#[source] BoxError),
}

impl OpError {
    pub(crate) fn input<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        OpError::Input(Box::new(e))
    }

    pub(crate) fn output<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        OpError::Output(Box::new(e))
    }
}

/// Wrap already-decoded rows as an infallible row source.
pub fn rows_ok(rows: Vec<Row>) -> impl Iterator<Item = Result<Row, Infallible>> {
    rows.into_iter().map(Ok)
}

/// Key configuration shared by the two-file operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOpOptions {
    pub left_columns: KeySpec,
    pub right_columns: KeySpec,

    /// Lower-case extracted keys on both sides before matching.
    #[serde(default)]
    pub ignore_case: bool,
}

impl SetOpOptions {
    pub fn new(left_columns: KeySpec, right_columns: KeySpec) -> Self {
        Self {
            left_columns,
            right_columns,
            ignore_case: false,
        }
    }

    pub fn ignore_case(mut self, yes: bool) -> Self {
        self.ignore_case = yes;
        self
    }

    /// False when the two key specs name different numbers of columns. Such
    /// keys never compare equal, so a join emits nothing and a diff keeps
    /// every left row.
    pub fn same_arity(&self) -> bool {
        self.left_columns.columns().len() == self.right_columns.columns().len()
    }

    pub(crate) fn left_key(&self, row: &[String]) -> Result<String, OpError> {
        Ok(self.left_columns.extract_folded(row, self.ignore_case)?)
    }

    pub(crate) fn right_key(&self, row: &[String]) -> Result<String, OpError> {
        Ok(self.right_columns.extract_folded(row, self.ignore_case)?)
    }
}

/// A two-input operator: the left input is indexed in one pass, the right
/// input is streamed against it in a second pass.
///
/// Invariants:
/// - Each input is read exactly once, front to back.
/// - The first error from either source, the key extractor or the sink aborts
///   the run. Rows already written to the sink are not retracted, so callers
///   that need all-or-nothing output collect into a `Vec<Row>` first.
pub trait SetOperator {
    /// Human-readable operator name (stable).
    fn name(&self) -> &'static str;

    fn run<L, R, EL, ER, S>(&self, left: L, right: R, sink: &mut S) -> Result<OpStats, OpError>
    where
        L: IntoIterator<Item = Result<Row, EL>>,
        R: IntoIterator<Item = Result<Row, ER>>,
        EL: std::error::Error + Send + Sync + 'static,
        ER: std::error::Error + Send + Sync + 'static,
        S: RowSink;
}
