//! flatops CLI: keyed joins, diffs, group-by aggregates and prefix search over
//! delimited text files.

mod job;

use clap::{Args, Parser, Subcommand};
use flatops_core::config::{CodecConfig, Delimiter};
use flatops_core::key::KeySpec;
use flatops_core::row::{Row, RowSink};
use flatops_io::{CsvRowReader, CsvRowWriter, SortedFileSearcher};
use flatops_operators::{
    AggFunction, Diff, GroupBy, GroupByOptions, HashJoin, SetOpOptions, SetOperator, WhereFilter,
};
use job::{parse_yaml_job, Job};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "flatops")]
#[command(about = "Keyed joins, diffs, group-by aggregates and prefix search over delimited text files", long_about = None)]
struct Cli {
    /// Log operator statistics and searcher probes to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Inputs and key options shared by `join` and `diff`.
#[derive(Args)]
struct SetOpArgs {
    /// Left input file
    left_file: PathBuf,

    /// Right input file
    right_file: PathBuf,

    /// Match keys case-insensitively
    #[arg(short, long)]
    ignore_case: bool,

    /// Key columns of the left file, e.g. "0,2"
    #[arg(long, default_value = "0")]
    left_columns: KeySpec,

    /// Key columns of the right file, e.g. "1,0"
    #[arg(long, default_value = "0")]
    right_columns: KeySpec,

    /// Left file delimiter (also used for output)
    #[arg(long)]
    left_delim: Option<Delimiter>,

    /// Right file delimiter
    #[arg(long)]
    right_delim: Option<Delimiter>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl SetOpArgs {
    fn options(&self) -> SetOpOptions {
        SetOpOptions::new(self.left_columns.clone(), self.right_columns.clone())
            .ignore_case(self.ignore_case)
    }
}

fn warn_on_arity_mismatch(options: &SetOpOptions) {
    if !options.same_arity() {
        tracing::warn!(
            left = %options.left_columns,
            right = %options.right_columns,
            "left and right keys have different column counts; no key can match"
        );
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Emit left rows whose key occurs in the right file
    Join {
        #[command(flatten)]
        args: SetOpArgs,

        /// Right-file columns appended to each emitted row, e.g. "3,4"
        #[arg(long, value_delimiter = ',')]
        insert_cols: Vec<usize>,
    },

    /// Emit left rows whose key does not occur in the right file
    Diff {
        #[command(flatten)]
        args: SetOpArgs,
    },

    /// Group rows by columns and aggregate others (sum or count)
    Select {
        /// Input file
        file: PathBuf,

        /// Group-by columns, e.g. "0,1"
        #[arg(short, long, default_value = "0")]
        select_cols: KeySpec,

        /// Aggregated columns, e.g. "2,3"
        #[arg(short, long, value_delimiter = ',', default_value = "1")]
        aggregate_cols: Vec<usize>,

        /// Field delimiter
        #[arg(short, long)]
        delim: Option<Delimiter>,

        /// Aggregate function: sum or count
        #[arg(short = 'f', long, default_value = "sum")]
        aggregate_function: AggFunction,

        /// Where clause such as "1=a,b" or "3!=x"; repeatable
        #[arg(short, long = "where")]
        where_clauses: Vec<String>,

        /// Print the equivalent SQL to stderr before running
        #[arg(short, long)]
        verbose: bool,

        /// Treat the first row as data instead of a header
        #[arg(long)]
        no_header: bool,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print every line of a sorted file that starts with a prefix
    Search {
        /// Sorted input file
        file: PathBuf,

        /// Prefix to look up
        prefix: String,

        /// Check the file is sorted before searching
        #[arg(long)]
        verify: bool,
    },

    /// Execute an operation described by a YAML job file
    Run {
        /// Path to the job YAML file
        #[arg(short, long)]
        job: PathBuf,

        /// Output file (overrides the job's)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Commands::Join { args, insert_cols } => run_join(&args, insert_cols),
        Commands::Diff { args } => run_diff(&args),
        Commands::Select {
            file,
            select_cols,
            aggregate_cols,
            delim,
            aggregate_function,
            where_clauses,
            verbose,
            no_header,
            output,
        } => WhereFilter::from_clauses(&where_clauses)
            .map_err(Into::into)
            .and_then(|filter| {
                let options = GroupByOptions::new(select_cols, aggregate_cols, aggregate_function)
                    .with_filter(filter)
                    .skip_header(!no_header);
                let codec = codec_with_overrides(CodecConfig::from_env(), None, None, delim);
                run_select(&file, options, &codec, verbose, output.as_deref())
            }),
        Commands::Search {
            file,
            prefix,
            verify,
        } => run_search(&file, &prefix, verify),
        Commands::Run { job, output } => run_job(&job, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("warn,flatops_io=debug,flatops_operators=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Apply command-line delimiter overrides on top of `base`.
fn codec_with_overrides(
    base: CodecConfig,
    left: Option<Delimiter>,
    right: Option<Delimiter>,
    single: Option<Delimiter>,
) -> CodecConfig {
    let mut cfg = base;
    if let Some(d) = left {
        cfg.left_delimiter = d;
    }
    if let Some(d) = right {
        cfg.right_delimiter = d;
    }
    if let Some(d) = single {
        cfg.delimiter = d;
    }
    cfg
}

fn run_join(args: &SetOpArgs, insert_cols: Vec<usize>) -> CliResult {
    let codec = codec_with_overrides(
        CodecConfig::from_env(),
        args.left_delim,
        args.right_delim,
        None,
    );
    let options = args.options();
    warn_on_arity_mismatch(&options);
    let op = HashJoin::new(options).with_insert_columns(insert_cols);
    run_set_op(
        &op,
        &args.left_file,
        &args.right_file,
        &codec,
        args.output.as_deref(),
    )
}

fn run_diff(args: &SetOpArgs) -> CliResult {
    let codec = codec_with_overrides(
        CodecConfig::from_env(),
        args.left_delim,
        args.right_delim,
        None,
    );
    let options = args.options();
    warn_on_arity_mismatch(&options);
    let op = Diff::new(options);
    run_set_op(
        &op,
        &args.left_file,
        &args.right_file,
        &codec,
        args.output.as_deref(),
    )
}

/// Run a two-file operator; output is written only if the whole run succeeds.
fn run_set_op<O: SetOperator>(
    op: &O,
    left: &Path,
    right: &Path,
    codec: &CodecConfig,
    output: Option<&Path>,
) -> CliResult {
    let left_rows = CsvRowReader::from_path(left, codec.left_delimiter)?;
    let right_rows = CsvRowReader::from_path(right, codec.right_delimiter)?;

    let mut rows: Vec<Row> = Vec::new();
    op.run(left_rows, right_rows, &mut rows)?;
    write_rows(&rows, codec.left_delimiter, output)?;
    Ok(())
}

fn run_select(
    file: &Path,
    options: GroupByOptions,
    codec: &CodecConfig,
    verbose: bool,
    output: Option<&Path>,
) -> CliResult {
    if verbose {
        eprintln!("{}", options.describe(&file.display().to_string()));
    }
    let op = GroupBy::new(options)?;
    let input = CsvRowReader::from_path(file, codec.delimiter)?;

    let mut rows: Vec<Row> = Vec::new();
    op.run(input, &mut rows)?;
    write_rows(&rows, codec.delimiter, output)?;
    Ok(())
}

fn run_search(file: &Path, prefix: &str, verify: bool) -> CliResult {
    let mut searcher = SortedFileSearcher::open(file)?;
    if verify {
        searcher.verify_sorted()?;
    }
    let matches = searcher.find(prefix)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in &matches {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}

fn run_job(path: &Path, output: Option<PathBuf>) -> CliResult {
    let yaml_content = fs::read_to_string(path)?;
    let job = parse_yaml_job(&yaml_content)?;
    let codec = job.codec(CodecConfig::from_env());
    tracing::debug!(job = %path.display(), ?codec, "running job");

    match &job {
        Job::Join {
            left,
            right,
            insert_columns,
            output: job_output,
            ..
        } => {
            let options = job.set_op_options().ok_or("join job without key options")?;
            warn_on_arity_mismatch(&options);
            let op = HashJoin::new(options).with_insert_columns(insert_columns.clone());
            let output = output.or_else(|| job_output.clone());
            run_set_op(&op, left, right, &codec, output.as_deref())
        }
        Job::Diff {
            left,
            right,
            output: job_output,
            ..
        } => {
            let options = job.set_op_options().ok_or("diff job without key options")?;
            warn_on_arity_mismatch(&options);
            let output = output.or_else(|| job_output.clone());
            run_set_op(&Diff::new(options), left, right, &codec, output.as_deref())
        }
        Job::Select {
            file,
            output: job_output,
            ..
        } => {
            let options = job
                .group_by_options()
                .ok_or("select job without group-by options")??;
            let output = output.or_else(|| job_output.clone());
            run_select(file, options, &codec, false, output.as_deref())
        }
        Job::Search {
            file,
            prefix,
            verify,
        } => run_search(file, prefix, *verify),
    }
}

/// Write rows to `output`, or to stdout when no path is given.
fn write_rows(rows: &[Row], delimiter: Delimiter, output: Option<&Path>) -> flatops_io::Result<()> {
    match output {
        Some(path) => {
            let mut writer = CsvRowWriter::to_path(path, delimiter)?;
            write_all(&mut writer, rows)
        }
        None => {
            let stdout = io::stdout();
            let mut writer = CsvRowWriter::to_writer(stdout.lock(), delimiter);
            write_all(&mut writer, rows)
        }
    }
}

fn write_all<W: Write>(writer: &mut CsvRowWriter<W>, rows: &[Row]) -> flatops_io::Result<()> {
    for row in rows {
        writer.write_row(row)?;
    }
    writer.flush()
}
