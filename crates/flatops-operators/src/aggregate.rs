//! Group-by aggregation: `SELECT <select>, f(<aggregate>) ... WHERE ... GROUP BY <select>`.
//!
//! Rows pass the where filter, are grouped by the composite key of the select
//! columns, and update one accumulator per (group, aggregate column). Each
//! group emits its split key followed by the accumulators in ascending column
//! order. Groups are emitted in first-encounter order.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use flatops_core::key::{split_key, KeySpec};
use flatops_core::row::{field, Row, RowSink};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::filter::WhereFilter;
use crate::metrics::{self, OpStats};
use crate::traits::OpError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunction {
    #[default]
    Sum,
    Count,
}

impl FromStr for AggFunction {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, OpError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AggFunction::Sum),
            "count" => Ok(AggFunction::Count),
            other => Err(OpError::Config(format!(
                "unknown aggregate function '{other}': expected 'sum' or 'count'"
            ))),
        }
    }
}

impl fmt::Display for AggFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggFunction::Sum => f.write_str("sum"),
            AggFunction::Count => f.write_str("count"),
        }
    }
}

/// Running value for one (group, column) pair. Starts at zero, never decreases
/// for `Count`.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Accumulator {
    Sum(f64),
    Count(u64),
}

impl Accumulator {
    fn zero(function: AggFunction) -> Self {
        match function {
            AggFunction::Sum => Accumulator::Sum(0.0),
            AggFunction::Count => Accumulator::Count(0),
        }
    }

    fn update(&mut self, column: usize, value: &str) -> Result<(), OpError> {
        match self {
            Accumulator::Sum(total) => {
                let v = value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| OpError::NonNumeric {
                        column,
                        value: value.to_string(),
                    })?;
                *total += v;
            }
            Accumulator::Count(n) => *n += 1,
        }
        Ok(())
    }

    /// Sums always render as floating-point text (`15.0`), counts as integers.
    fn render(&self) -> String {
        match self {
            Accumulator::Sum(total) => render_float(*total),
            Accumulator::Count(n) => n.to_string(),
        }
    }
}

/// Shortest round-trip text for `v`: positional with at least one fractional
/// digit when the decimal exponent is in `-4..16`, otherwise scientific with a
/// signed exponent of at least two digits (`1e+16`, `1.5e-05`).
fn render_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".into();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf".into() } else { "-inf".into() };
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `-1.25e-7`.
    let sci = format!("{v:e}");
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(m) => ("-", m),
        None => ("", mantissa),
    };

    if !(-4..16).contains(&exp) {
        let exp_sign = if exp < 0 { '-' } else { '+' };
        return format!("{sign}{mantissa}e{exp_sign}{:02}", exp.abs());
    }

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    if exp < 0 {
        let zeros = "0".repeat((-exp - 1) as usize);
        return format!("{sign}0.{zeros}{digits}");
    }
    let int_len = exp as usize + 1;
    if digits.len() <= int_len {
        let pad = "0".repeat(int_len - digits.len());
        format!("{sign}{digits}{pad}.0")
    } else {
        let (int_part, frac) = digits.split_at(int_len);
        format!("{sign}{int_part}.{frac}")
    }
}

fn default_skip_header() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupByOptions {
    /// Group-by (and output) columns.
    pub select: KeySpec,

    /// Columns fed to the aggregate function. Must be non-empty.
    pub aggregate: Vec<usize>,

    #[serde(default)]
    pub function: AggFunction,

    #[serde(default, rename = "where")]
    pub filter: WhereFilter,

    /// Treat the first input row as a header and ignore it.
    #[serde(default = "default_skip_header")]
    pub skip_header: bool,
}

impl GroupByOptions {
    pub fn new(select: KeySpec, aggregate: Vec<usize>, function: AggFunction) -> Self {
        Self {
            select,
            aggregate,
            function,
            filter: WhereFilter::new(),
            skip_header: true,
        }
    }

    pub fn with_filter(mut self, filter: WhereFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn skip_header(mut self, yes: bool) -> Self {
        self.skip_header = yes;
        self
    }

    pub fn validate(&self) -> Result<(), OpError> {
        if self.aggregate.is_empty() {
            return Err(OpError::Config(
                "at least one aggregate column is required".into(),
            ));
        }
        Ok(())
    }

    /// The equivalent SQL statement, for echoing a query back to the user.
    pub fn describe(&self, source: &str) -> String {
        let select = self
            .select
            .columns()
            .iter()
            .map(|c| format!("col{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let function = self.function.to_string().to_uppercase();
        let aggregates = self
            .aggregate
            .iter()
            .map(|c| format!("{function}(col{c})"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("SELECT {select}, {aggregates}\nFROM {source}\n");
        if !self.filter.is_empty() {
            sql.push_str(&format!("WHERE {}\n", self.filter));
        }
        sql.push_str(&format!("GROUP BY {select}"));
        sql
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBy {
    pub options: GroupByOptions,
}

impl GroupBy {
    pub fn new(options: GroupByOptions) -> Result<Self, OpError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn name(&self) -> &'static str {
        "group_by"
    }

    pub fn run<I, E, S>(&self, rows: I, sink: &mut S) -> Result<OpStats, OpError>
    where
        I: IntoIterator<Item = Result<Row, E>>,
        E: std::error::Error + Send + Sync + 'static,
        S: RowSink,
    {
        self.options.validate()?;
        let opts = &self.options;
        let mut stats = OpStats::default();

        let mut groups: IndexMap<String, BTreeMap<usize, Accumulator>> = IndexMap::new();
        for (i, row) in rows.into_iter().enumerate() {
            let row = row.map_err(OpError::input)?;
            stats.left_rows += 1;
            if i == 0 && opts.skip_header {
                stats.skipped_rows += 1;
                continue;
            }
            if !opts.filter.matches(&row)? {
                stats.skipped_rows += 1;
                continue;
            }

            let key = opts.select.extract(&row)?;
            let accumulators = groups.entry(key).or_default();
            for &column in &opts.aggregate {
                let value = field(&row, column)?;
                accumulators
                    .entry(column)
                    .or_insert_with(|| Accumulator::zero(opts.function))
                    .update(column, value)?;
            }
        }
        stats.keys = groups.len() as u64;

        for (key, accumulators) in &groups {
            let mut out = split_key(key);
            out.extend(accumulators.values().map(Accumulator::render));
            sink.write_row(&out).map_err(OpError::output)?;
            stats.emitted_rows += 1;
        }

        metrics::emit(self.name(), &stats);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::rows_ok;

    fn rows(data: &[&[&str]]) -> Vec<Row> {
        data.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn options(select: &[usize], aggregate: &[usize], function: AggFunction) -> GroupByOptions {
        GroupByOptions::new(
            KeySpec::new(select.to_vec()).unwrap(),
            aggregate.to_vec(),
            function,
        )
        .skip_header(false)
    }

    fn run_sorted(options: GroupByOptions, data: &[&[&str]]) -> Vec<Row> {
        let mut out: Vec<Row> = Vec::new();
        GroupBy::new(options)
            .unwrap()
            .run(rows_ok(rows(data)), &mut out)
            .unwrap();
        out.sort();
        out
    }

    const SAMPLE: &[&[&str]] = &[
        &["name", "category", "value", "city"],
        &["item1", "A", "10", "New York"],
        &["itemČ", "B", "20", "London"],
        &["item1", "A", "5", "Paris"],
        &["itemÖ", "C", "30", "Berlin"],
        &["itemČ", "B", "15", "London"],
        &["itemØ", "A", "25", "New York"],
    ];

    #[test]
    fn sum_renders_floats() {
        let out = run_sorted(
            options(&[0], &[1], AggFunction::Sum),
            &[&["A", "10"], &["A", "5"], &["B", "20"]],
        );
        assert_eq!(out, rows(&[&["A", "15.0"], &["B", "20.0"]]));
    }

    #[test]
    fn large_and_tiny_sums_keep_float_form() {
        let out = run_sorted(
            options(&[0], &[1], AggFunction::Sum),
            &[&["a", "1e16"], &["b", "0.00001"], &["c", "1e22"], &["d", "0.0001"]],
        );
        assert_eq!(
            out,
            rows(&[
                &["a", "1e+16"],
                &["b", "1e-05"],
                &["c", "1e+22"],
                &["d", "0.0001"],
            ])
        );
    }

    #[test]
    fn float_text_matches_shortest_repr() {
        assert_eq!(render_float(0.0), "0.0");
        assert_eq!(render_float(-0.5), "-0.5");
        assert_eq!(render_float(2.75), "2.75");
        assert_eq!(render_float(1234.5), "1234.5");
        assert_eq!(render_float(9999999999999998.0), "9999999999999998.0");
        assert_eq!(render_float(1.5e16), "1.5e+16");
        assert_eq!(render_float(-1.25e-7), "-1.25e-07");
        assert_eq!(render_float(1e100), "1e+100");
        assert_eq!(render_float(f64::INFINITY), "inf");
    }

    #[test]
    fn header_is_skipped_by_default() {
        let opts = options(&[1], &[2], AggFunction::Sum).skip_header(true);
        let out = run_sorted(opts, SAMPLE);
        assert_eq!(
            out,
            rows(&[&["A", "40.0"], &["B", "35.0"], &["C", "30.0"]])
        );
    }

    #[test]
    fn count_ignores_content() {
        let opts = options(&[1], &[1], AggFunction::Count).skip_header(true);
        let out = run_sorted(opts, SAMPLE);
        assert_eq!(out, rows(&[&["A", "3"], &["B", "2"], &["C", "1"]]));
    }

    #[test]
    fn multi_column_groups_split_back() {
        let opts = options(&[0, 1], &[2], AggFunction::Sum).skip_header(true);
        let out = run_sorted(opts, SAMPLE);
        // Byte order: Ö (C3 96) < Ø (C3 98) < Č (C4 8C).
        assert_eq!(
            out,
            rows(&[
                &["item1", "A", "15.0"],
                &["itemÖ", "C", "30.0"],
                &["itemØ", "A", "25.0"],
                &["itemČ", "B", "35.0"],
            ])
        );
    }

    #[test]
    fn where_filter_applies_before_grouping() {
        let filter = WhereFilter::from_clauses(["1!=A"]).unwrap();
        let opts = options(&[1], &[2], AggFunction::Sum)
            .skip_header(true)
            .with_filter(filter);
        let out = run_sorted(opts, SAMPLE);
        assert_eq!(out, rows(&[&["B", "35.0"], &["C", "30.0"]]));

        let filter = WhereFilter::from_clauses(["0=itemČ"]).unwrap();
        let opts = options(&[0], &[2], AggFunction::Sum)
            .skip_header(true)
            .with_filter(filter);
        assert_eq!(run_sorted(opts, SAMPLE), rows(&[&["itemČ", "35.0"]]));
    }

    #[test]
    fn aggregates_emit_in_ascending_column_order() {
        let out = run_sorted(
            options(&[0], &[3, 1], AggFunction::Sum),
            &[&["g", "1", "x", "100"], &["g", "2.5", "y", "-1"]],
        );
        assert_eq!(out, rows(&[&["g", "3.5", "99.0"]]));
    }

    #[test]
    fn non_numeric_sum_aborts() {
        let mut out: Vec<Row> = Vec::new();
        let err = GroupBy::new(options(&[0], &[1], AggFunction::Sum))
            .unwrap()
            .run(rows_ok(rows(&[&["a", "1"], &["a", "one"]])), &mut out)
            .unwrap_err();
        match err {
            OpError::NonNumeric { column, value } => {
                assert_eq!(column, 1);
                assert_eq!(value, "one");
            }
            other => panic!("expected NonNumeric, got {other:?}"),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn header_only_and_empty_inputs() {
        let opts = options(&[0], &[1], AggFunction::Sum).skip_header(true);
        assert!(run_sorted(opts.clone(), &[&["h0", "h1"]]).is_empty());
        assert!(run_sorted(opts, &[]).is_empty());
    }

    #[test]
    fn parses_function_names() {
        assert_eq!("SUM".parse::<AggFunction>().unwrap(), AggFunction::Sum);
        assert_eq!(" count".parse::<AggFunction>().unwrap(), AggFunction::Count);
        assert!(matches!(
            "avg".parse::<AggFunction>(),
            Err(OpError::Config(_))
        ));
    }

    #[test]
    fn empty_aggregate_list_rejected() {
        assert!(GroupBy::new(options(&[0], &[], AggFunction::Count)).is_err());
    }

    #[test]
    fn rerun_is_idempotent() {
        let opts = options(&[1], &[2], AggFunction::Sum).skip_header(true);
        assert_eq!(run_sorted(opts.clone(), SAMPLE), run_sorted(opts, SAMPLE));
    }

    #[test]
    fn describe_echoes_sql() {
        let opts = options(&[0, 1], &[2], AggFunction::Sum)
            .with_filter(WhereFilter::from_clauses(["0!=c", "1=a,b"]).unwrap());
        assert_eq!(
            opts.describe("file1.txt"),
            "SELECT col0, col1, SUM(col2)\nFROM file1.txt\n\
             WHERE col0 NOT IN (\"c\") AND col1 IN (\"a\", \"b\")\n\
             GROUP BY col0, col1"
        );
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: GroupByOptions =
            serde_json::from_str(r#"{"select":[1],"aggregate":[2]}"#).unwrap();
        assert_eq!(opts.function, AggFunction::Sum);
        assert!(opts.skip_header);
        assert!(opts.filter.is_empty());
    }
}
