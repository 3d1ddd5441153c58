//! YAML job files: one operation per document, tagged by `op`.
//!
//! Example:
//! ```yaml
//! op: join
//! left: data/users.csv
//! right: data/orders.tsv
//! left_columns: [0]
//! right_columns: [2]
//! insert_columns: [3, 4]
//! left_delimiter: ","
//! right_delimiter: "\t"
//! output: out/joined.csv
//! ```
//!
//! Delimiters left out of the job fall back to the environment/default codec
//! config; command-line flags override both.

use std::path::PathBuf;

use flatops_core::config::{CodecConfig, Delimiter};
use flatops_core::key::KeySpec;
use flatops_operators::{AggFunction, GroupByOptions, SetOpOptions, WhereFilter};
use serde::{Deserialize, Serialize};

fn first_column() -> KeySpec {
    KeySpec::single(0)
}

fn second_column() -> Vec<usize> {
    vec![1]
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Job {
    Join {
        left: PathBuf,
        right: PathBuf,
        #[serde(default = "first_column")]
        left_columns: KeySpec,
        #[serde(default = "first_column")]
        right_columns: KeySpec,
        #[serde(default)]
        ignore_case: bool,
        #[serde(default)]
        insert_columns: Vec<usize>,
        #[serde(default)]
        left_delimiter: Option<Delimiter>,
        #[serde(default)]
        right_delimiter: Option<Delimiter>,
        #[serde(default)]
        output: Option<PathBuf>,
    },

    Diff {
        left: PathBuf,
        right: PathBuf,
        #[serde(default = "first_column")]
        left_columns: KeySpec,
        #[serde(default = "first_column")]
        right_columns: KeySpec,
        #[serde(default)]
        ignore_case: bool,
        #[serde(default)]
        left_delimiter: Option<Delimiter>,
        #[serde(default)]
        right_delimiter: Option<Delimiter>,
        #[serde(default)]
        output: Option<PathBuf>,
    },

    Select {
        file: PathBuf,
        #[serde(default = "first_column")]
        select: KeySpec,
        #[serde(default = "second_column")]
        aggregate: Vec<usize>,
        #[serde(default)]
        function: AggFunction,
        /// Where clauses in their text form, e.g. `"1=a,b"`.
        #[serde(default, rename = "where")]
        where_clauses: Vec<String>,
        #[serde(default = "yes")]
        skip_header: bool,
        #[serde(default)]
        delimiter: Option<Delimiter>,
        #[serde(default)]
        output: Option<PathBuf>,
    },

    Search {
        file: PathBuf,
        prefix: String,
        #[serde(default)]
        verify: bool,
    },
}

impl Job {
    /// Fold the job's delimiters over `base`.
    pub fn codec(&self, base: CodecConfig) -> CodecConfig {
        let mut cfg = base;
        match self {
            Job::Join {
                left_delimiter,
                right_delimiter,
                ..
            }
            | Job::Diff {
                left_delimiter,
                right_delimiter,
                ..
            } => {
                if let Some(d) = left_delimiter {
                    cfg.left_delimiter = *d;
                }
                if let Some(d) = right_delimiter {
                    cfg.right_delimiter = *d;
                }
            }
            Job::Select { delimiter, .. } => {
                if let Some(d) = delimiter {
                    cfg.delimiter = *d;
                }
            }
            Job::Search { .. } => {}
        }
        cfg
    }

    /// Key options for join/diff jobs.
    pub fn set_op_options(&self) -> Option<SetOpOptions> {
        match self {
            Job::Join {
                left_columns,
                right_columns,
                ignore_case,
                ..
            }
            | Job::Diff {
                left_columns,
                right_columns,
                ignore_case,
                ..
            } => Some(
                SetOpOptions::new(left_columns.clone(), right_columns.clone())
                    .ignore_case(*ignore_case),
            ),
            _ => None,
        }
    }

    /// Group-by options for select jobs; where clauses are parsed here.
    pub fn group_by_options(
        &self,
    ) -> Option<Result<GroupByOptions, flatops_operators::OpError>> {
        match self {
            Job::Select {
                select,
                aggregate,
                function,
                where_clauses,
                skip_header,
                ..
            } => Some(WhereFilter::from_clauses(where_clauses).map(|filter| {
                GroupByOptions::new(select.clone(), aggregate.clone(), *function)
                    .with_filter(filter)
                    .skip_header(*skip_header)
            })),
            _ => None,
        }
    }
}

pub fn parse_yaml_job(yaml: &str) -> Result<Job, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_with_defaults() {
        let job = parse_yaml_job(
            r#"
op: join
left: a.csv
right: b.tsv
insert_columns: [3, 1]
left_delimiter: ","
"#,
        )
        .unwrap();
        let opts = job.set_op_options().unwrap();
        assert_eq!(opts.left_columns.columns(), &[0]);
        assert_eq!(opts.right_columns.columns(), &[0]);
        assert!(!opts.ignore_case);

        let codec = job.codec(CodecConfig::default());
        assert_eq!(codec.left_delimiter, Delimiter::COMMA);
        assert_eq!(codec.right_delimiter, Delimiter::TAB);
        match job {
            Job::Join { insert_columns, .. } => assert_eq!(insert_columns, vec![3, 1]),
            other => panic!("expected join, got {other:?}"),
        }
    }

    #[test]
    fn parses_select_with_where() {
        let job = parse_yaml_job(
            r#"
op: select
file: sales.csv
select: [0, 1]
aggregate: [2]
function: count
where: ["0!=c", "1=a,b"]
delimiter: ","
"#,
        )
        .unwrap();
        let opts = job.group_by_options().unwrap().unwrap();
        assert_eq!(opts.function, AggFunction::Count);
        assert!(opts.skip_header);
        assert_eq!(opts.filter.clauses().count(), 2);
        assert_eq!(job.codec(CodecConfig::default()).delimiter, Delimiter::COMMA);
    }

    #[test]
    fn rejects_unknown_op_and_empty_keys() {
        assert!(parse_yaml_job("op: union\nleft: a\nright: b\n").is_err());
        assert!(parse_yaml_job("op: diff\nleft: a\nright: b\nleft_columns: []\n").is_err());
        assert!(parse_yaml_job("op: select\nfile: f\nfunction: avg\n").is_err());
    }

    #[test]
    fn bad_where_clause_surfaces_from_options() {
        let job = parse_yaml_job("op: select\nfile: f\nwhere: [\"nope\"]\n").unwrap();
        assert!(job.group_by_options().unwrap().is_err());
    }
}
