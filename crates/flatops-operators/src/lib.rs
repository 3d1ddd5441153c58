#![forbid(unsafe_code)]
//! flatops-operators: key-indexed set operations and group-by aggregation.
//!
//! Design intent:
//! - Pure and synchronous. Engines consume row iterators and write to a
//!   `RowSink`; the caller owns the files.
//! - Every run builds and discards its own index. Nothing is shared between runs.
//! - Any failure aborts the run; there is no partial-result mode.

pub mod aggregate;
pub mod diff;
pub mod filter;
pub mod join;
pub mod metrics;
pub mod traits;

pub use aggregate::{AggFunction, GroupBy, GroupByOptions};
pub use diff::Diff;
pub use filter::{Membership, MembershipKind, WhereFilter};
pub use join::HashJoin;
pub use metrics::OpStats;
pub use traits::{OpError, SetOpOptions, SetOperator};
