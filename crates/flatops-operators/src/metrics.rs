//! Per-run statistics and the tracing hook that reports them.

use serde::{Deserialize, Serialize};

/// Counters collected by every engine run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpStats {
    /// Rows read from the left (or only) input.
    pub left_rows: u64,
    /// Rows read from the right input.
    pub right_rows: u64,
    /// Distinct keys in the index (join/diff) or distinct groups (group-by).
    pub keys: u64,
    /// Rows rejected by the where filter or skipped as a header.
    pub skipped_rows: u64,
    /// Rows written to the sink.
    pub emitted_rows: u64,
}

#[cfg(feature = "tracing")]
pub fn emit(op: &'static str, stats: &OpStats) {
    tracing::info!(
        op,
        left_rows = stats.left_rows,
        right_rows = stats.right_rows,
        keys = stats.keys,
        skipped_rows = stats.skipped_rows,
        emitted_rows = stats.emitted_rows,
        "operator finished"
    );
}

#[cfg(not(feature = "tracing"))]
pub fn emit(_op: &'static str, _stats: &OpStats) { /* no-op */
}
