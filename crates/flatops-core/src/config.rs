//! Codec configuration shared by the CLI and job files.
//!
//! Engines never read this; they receive their own option structs. The codec
//! layer uses it to pick field delimiters for each input and for output.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A single-byte field delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Delimiter(u8);

impl Delimiter {
    pub const TAB: Delimiter = Delimiter(b'\t');
    pub const COMMA: Delimiter = Delimiter(b',');

    pub fn byte(self) -> u8 {
        self.0
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::TAB
    }
}

impl FromStr for Delimiter {
    type Err = Error;

    /// Accepts one ASCII character, or `\t` / `tab` for a tab.
    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "\\t" | "tab" | "TAB" => Ok(Self::TAB),
            _ => match s.as_bytes() {
                [b] if b.is_ascii() && *b != b'\n' && *b != b'\r' && *b != b'"' => Ok(Self(*b)),
                _ => Err(Error::InvalidDelimiter(s.to_string())),
            },
        }
    }
}

impl TryFrom<String> for Delimiter {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Error> {
        s.parse()
    }
}

impl From<Delimiter> for String {
    fn from(d: Delimiter) -> Self {
        d.to_string()
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            b'\t' => f.write_str("\\t"),
            b => write!(f, "{}", b as char),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Delimiter of the left input of two-file operators (also used for output).
    pub left_delimiter: Delimiter,

    /// Delimiter of the right input of two-file operators.
    pub right_delimiter: Delimiter,

    /// Delimiter of single-file operators (input and output).
    pub delimiter: Delimiter,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            left_delimiter: Delimiter::TAB,
            right_delimiter: Delimiter::TAB,
            delimiter: Delimiter::TAB,
        }
    }
}

impl CodecConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `FLATOPS_LEFT_DELIM`: left-file delimiter
    /// - `FLATOPS_RIGHT_DELIM`: right-file delimiter
    /// - `FLATOPS_DELIM`: single-file delimiter
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("FLATOPS_LEFT_DELIM") {
            if let Ok(d) = s.parse() {
                cfg.left_delimiter = d;
            }
        }

        if let Ok(s) = std::env::var("FLATOPS_RIGHT_DELIM") {
            if let Ok(d) = s.parse() {
                cfg.right_delimiter = d;
            }
        }

        if let Ok(s) = std::env::var("FLATOPS_DELIM") {
            if let Ok(d) = s.parse() {
                cfg.delimiter = d;
            }
        }

        cfg
    }
}
