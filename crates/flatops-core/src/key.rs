//! Composite keys built from selected columns of a row.
//!
//! Field values are joined with [`KEY_DELIMITER`], which is reserved and must
//! not appear inside key fields for [`split_key`] to reconstruct them. Keys
//! are order-sensitive: `[0, 2]` and `[2, 0]` produce different keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::row::field;

/// Internal separator between the fields of a composite key.
pub const KEY_DELIMITER: char = '\t';

/// Ordered, non-empty list of 0-based column indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct KeySpec(Vec<usize>);

impl KeySpec {
    pub fn new(columns: Vec<usize>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::EmptyKey);
        }
        Ok(Self(columns))
    }

    /// Key on a single column.
    pub fn single(column: usize) -> Self {
        Self(vec![column])
    }

    pub fn columns(&self) -> &[usize] {
        &self.0
    }

    /// Build the composite key for `row`.
    pub fn extract(&self, row: &[String]) -> Result<String> {
        let mut columns = self.0.iter();
        // `new` guarantees at least one column.
        let first = match columns.next() {
            Some(&c) => c,
            None => return Err(Error::EmptyKey),
        };
        let mut key = field(row, first)?.to_owned();
        for &c in columns {
            key.push(KEY_DELIMITER);
            key.push_str(field(row, c)?);
        }
        Ok(key)
    }

    /// Like [`extract`](Self::extract), lower-casing the key when `ignore_case` is set.
    pub fn extract_folded(&self, row: &[String], ignore_case: bool) -> Result<String> {
        self.extract(row).map(|k| fold_key(k, ignore_case))
    }
}

impl TryFrom<Vec<usize>> for KeySpec {
    type Error = Error;

    fn try_from(columns: Vec<usize>) -> Result<Self> {
        Self::new(columns)
    }
}

impl From<KeySpec> for Vec<usize> {
    fn from(spec: KeySpec) -> Self {
        spec.0
    }
}

impl FromStr for KeySpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(parse_columns(s)?)
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Parse a column list such as `"0,1,5"`. An empty string yields an empty list.
pub fn parse_columns(s: &str) -> Result<Vec<usize>> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<usize>()
                .map_err(|_| Error::InvalidColumn(part.to_string()))
        })
        .collect()
}

/// Split a composite key back into its field values.
pub fn split_key(key: &str) -> Vec<String> {
    key.split(KEY_DELIMITER).map(str::to_owned).collect()
}

/// Case-fold a key for matching. Emitted row content is never folded.
pub fn fold_key(key: String, ignore_case: bool) -> String {
    if ignore_case {
        key.to_lowercase()
    } else {
        key
    }
}
