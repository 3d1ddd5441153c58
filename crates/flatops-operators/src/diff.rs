//! Order-preserving set difference: left rows whose key never occurs on the right.
//!
//! The left index is insertion-ordered, so surviving rows come out in original
//! left order. One matching right row removes every left row of that key.

use flatops_core::row::{Row, RowSink};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::metrics::{self, OpStats};
use crate::traits::{OpError, SetOpOptions, SetOperator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    pub options: SetOpOptions,
}

impl Diff {
    pub fn new(options: SetOpOptions) -> Self {
        Self { options }
    }
}

impl SetOperator for Diff {
    fn name(&self) -> &'static str {
        "diff"
    }

    fn run<L, R, EL, ER, S>(&self, left: L, right: R, sink: &mut S) -> Result<OpStats, OpError>
    where
        L: IntoIterator<Item = Result<Row, EL>>,
        R: IntoIterator<Item = Result<Row, ER>>,
        EL: std::error::Error + Send + Sync + 'static,
        ER: std::error::Error + Send + Sync + 'static,
        S: RowSink,
    {
        let mut stats = OpStats::default();

        let mut index: IndexMap<String, Vec<Row>> = IndexMap::new();
        for row in left {
            let row = row.map_err(OpError::input)?;
            stats.left_rows += 1;
            let key = self.options.left_key(&row)?;
            index.entry(key).or_default().push(row);
        }
        stats.keys = index.len() as u64;

        // A removed key keeps its slot with an empty bucket, so the
        // surviving keys stay in left order.
        for row in right {
            let row = row.map_err(OpError::input)?;
            stats.right_rows += 1;
            let key = self.options.right_key(&row)?;
            if let Some(bucket) = index.get_mut(&key) {
                *bucket = Vec::new();
            }
        }

        for out in index.values().flatten() {
            sink.write_row(out).map_err(OpError::output)?;
            stats.emitted_rows += 1;
        }

        metrics::emit(self.name(), &stats);
        Ok(stats)
    }
}
