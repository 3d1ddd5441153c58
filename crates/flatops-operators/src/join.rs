//! Hash join (inner) with optional projection of right-side columns.
//!
//! The left input is indexed by composite key, keeping every left row of a key
//! in encounter order. Each right row looks up its key; on a hit, every left row
//! of the bucket is emitted with the right row's `insert_columns` appended, and
//! the key is then removed. A later right row with the same key therefore emits
//! nothing: the first right occurrence consumes the whole bucket.
//!
//! Output follows right-input order across keys and left order within a key.
//! Left keys that never appear on the right are dropped.

use std::collections::HashMap;

use flatops_core::row::{project, Row, RowSink};
use serde::{Deserialize, Serialize};

use crate::metrics::{self, OpStats};
use crate::traits::{OpError, SetOpOptions, SetOperator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashJoin {
    pub options: SetOpOptions,

    /// Right-side columns appended to each emitted left row, in this order.
    #[serde(default)]
    pub insert_columns: Vec<usize>,
}

impl HashJoin {
    pub fn new(options: SetOpOptions) -> Self {
        Self {
            options,
            insert_columns: Vec::new(),
        }
    }

    pub fn with_insert_columns(mut self, columns: Vec<usize>) -> Self {
        self.insert_columns = columns;
        self
    }
}

impl SetOperator for HashJoin {
    fn name(&self) -> &'static str {
        "join"
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

        let mut index: HashMap<String, Vec<Row>> = HashMap::new();
        for row in left {
            let row = row.map_err(OpError::input)?;
            stats.left_rows += 1;
            let key = self.options.left_key(&row)?;
            index.entry(key).or_default().push(row);
        }
        stats.keys = index.len() as u64;

        for row in right {
            let row = row.map_err(OpError::input)?;
            stats.right_rows += 1;
            let key = self.options.right_key(&row)?;
            let Some(bucket) = index.remove(&key) else {
                continue;
            };
            let inserted = project(&row, &self.insert_columns)?;
            for mut out in bucket {
                out.extend(inserted.iter().cloned());
                sink.write_row(&out).map_err(OpError::output)?;
                stats.emitted_rows += 1;
            }
        }

        metrics::emit(self.name(), &stats);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::rows_ok;
    use flatops_core::key::KeySpec;
    use flatops_core::Error as CoreError;

    fn rows(data: &[&[&str]]) -> Vec<Row> {
        data.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn key(cols: &[usize]) -> KeySpec {
        KeySpec::new(cols.to_vec()).unwrap()
    }

    fn join(op: &HashJoin, left: &[&[&str]], right: &[&[&str]]) -> Result<Vec<Row>, OpError> {
        let mut out: Vec<Row> = Vec::new();
        op.run(rows_ok(rows(left)), rows_ok(rows(right)), &mut out)?;
        Ok(out)
    }

    #[test]
    fn inner_join_drops_unmatched_left_rows() {
        let op = HashJoin::new(SetOpOptions::new(key(&[0]), key(&[0])));
        let out = join(&op, &[&["1", "A"], &["2", "B"]], &[&["1", "X"]]).unwrap();
        assert_eq!(out, rows(&[&["1", "A"]]));
    }

    #[test]
    fn bucket_fires_once_with_all_left_rows() {
        let op = HashJoin::new(SetOpOptions::new(key(&[0]), key(&[1])))
            .with_insert_columns(vec![2]);
        let left: &[&[&str]] = &[&["k", "l1"], &["j", "l2"], &["k", "l3"]];
        let right: &[&[&str]] = &[
            &["r1", "j", "first-j"],
            &["r2", "k", "first-k"],
            &["r3", "k", "second-k"],
            &["r4", "zz", "none"],
        ];
        let out = join(&op, left, right).unwrap();
        assert_eq!(
            out,
            rows(&[
                &["j", "l2", "first-j"],
                &["k", "l1", "first-k"],
                &["k", "l3", "first-k"],
            ])
        );
    }

    #[test]
    fn projection_keeps_requested_order() {
        let op = HashJoin::new(SetOpOptions::new(key(&[0]), key(&[0])))
            .with_insert_columns(vec![3, 1]);
        let out = join(&op, &[&["a", "x"]], &[&["a", "b", "c", "d"]]).unwrap();
        assert_eq!(out, rows(&[&["a", "x", "d", "b"]]));
    }

    #[test]
    fn composite_keys_with_different_column_sets() {
        let op = HashJoin::new(SetOpOptions::new(key(&[0, 1]), key(&[2, 0])));
        let out = join(
            &op,
            &[&["a", "b", "L1"], &["a", "c", "L2"]],
            &[&["b", "-", "a"], &["a", "-", "b"]],
        )
        .unwrap();
        assert_eq!(out, rows(&[&["a", "b", "L1"]]));
    }

    #[test]
    fn ignore_case_affects_matching_only() {
        let op = HashJoin::new(SetOpOptions::new(key(&[0]), key(&[0])).ignore_case(true));
        let out = join(&op, &[&["ABC", "1"]], &[&["abc"]]).unwrap();
        assert_eq!(out, rows(&[&["ABC", "1"]]));

        let strict = HashJoin::new(SetOpOptions::new(key(&[0]), key(&[0])));
        assert!(join(&strict, &[&["ABC", "1"]], &[&["abc"]]).unwrap().is_empty());
    }

    #[test]
    fn short_row_aborts_the_run() {
        let op = HashJoin::new(SetOpOptions::new(key(&[1]), key(&[0])));
        let err = join(&op, &[&["a", "b"], &["c"]], &[&["b"]]).unwrap_err();
        assert!(matches!(
            err,
            OpError::Core(CoreError::MissingColumn { index: 1, len: 1 })
        ));
    }

    #[test]
    fn bad_projection_column_aborts_on_match() {
        let op = HashJoin::new(SetOpOptions::new(key(&[0]), key(&[0])))
            .with_insert_columns(vec![5]);
        let err = join(&op, &[&["a"]], &[&["a", "b"]]).unwrap_err();
        assert!(matches!(
            err,
            OpError::Core(CoreError::MissingColumn { index: 5, .. })
        ));
    }

    #[test]
    fn mismatched_key_arity_never_matches() {
        let options = SetOpOptions::new(key(&[0]), key(&[0, 1]));
        assert!(!options.same_arity());
        let op = HashJoin::new(options);
        let out = join(&op, &[&["a"], &["x"]], &[&["x", "y"], &["a", "b"]]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn reports_stats() {
        let op = HashJoin::new(SetOpOptions::new(key(&[0]), key(&[0])));
        let mut out: Vec<Row> = Vec::new();
        let stats = op
            .run(
                rows_ok(rows(&[&["1"], &["1"], &["2"]])),
                rows_ok(rows(&[&["1"], &["3"]])),
                &mut out,
            )
            .unwrap();
        assert_eq!(stats.left_rows, 3);
        assert_eq!(stats.right_rows, 2);
        assert_eq!(stats.keys, 2);
        assert_eq!(stats.emitted_rows, 2);
    }
}
