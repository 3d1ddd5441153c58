//! Where filter: per-column membership constraints combined with AND.
//!
//! Text form, one clause per argument:
//! - `"1=a,b"`  → `col1 IN ("a", "b")`
//! - `"3!=x"`   → `col3 NOT IN ("x")`
//!
//! Values are taken verbatim (no trimming), so `"2="` constrains column 2 to
//! the empty string. A later clause on the same column replaces an earlier one.

use std::collections::BTreeMap;
use std::fmt;

use flatops_core::row::field;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::traits::OpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipKind {
    In,
    NotIn,
}

impl fmt::Display for MembershipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipKind::In => f.write_str("IN"),
            MembershipKind::NotIn => f.write_str("NOT IN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub kind: MembershipKind,
    /// Distinct values in the order they were given.
    pub values: IndexSet<String>,
}

impl Membership {
    pub fn new<I, S>(kind: MembershipKind, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        let present = self.values.contains(value);
        match self.kind {
            MembershipKind::In => present,
            MembershipKind::NotIn => !present,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhereFilter {
    clauses: BTreeMap<usize, Membership>,
}

impl WhereFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of clauses such as `["0!=c", "1=a,b"]`.
    pub fn from_clauses<I, S>(clauses: I) -> Result<Self, OpError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::new();
        for clause in clauses {
            let (column, membership) = parse_clause(clause.as_ref())?;
            filter.insert(column, membership);
        }
        Ok(filter)
    }

    pub fn insert(&mut self, column: usize, membership: Membership) {
        self.clauses.insert(column, membership);
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> impl Iterator<Item = (usize, &Membership)> {
        self.clauses.iter().map(|(c, m)| (*c, m))
    }

    /// True when `row` satisfies every clause. A constrained column missing
    /// from the row is an error, not a rejection.
    pub fn matches(&self, row: &[String]) -> Result<bool, OpError> {
        for (&column, membership) in &self.clauses {
            if !membership.accepts(field(row, column)?) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Display for WhereFilter {
    /// SQL-like rendering: `col1 IN ("a", "b") AND col3 NOT IN ("x")`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (column, m)) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "col{column} {} (", m.kind)?;
            for (j, v) in m.values.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "\"{v}\"")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

fn parse_clause(clause: &str) -> Result<(usize, Membership), OpError> {
    let (column, kind, values) = if let Some((c, v)) = clause.split_once("!=") {
        (c, MembershipKind::NotIn, v)
    } else if let Some((c, v)) = clause.split_once('=') {
        (c, MembershipKind::In, v)
    } else {
        return Err(OpError::Config(format!(
            "where clause '{clause}' has no '=' or '!='"
        )));
    };
    let column = column.trim().parse::<usize>().map_err(|_| {
        OpError::Config(format!(
            "where clause '{clause}': '{}' is not a column number",
            column.trim()
        ))
    })?;
    Ok((column, Membership::new(kind, values.split(','))))
}
