use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use postbook_config::{Config, LoadOptions};
use postbook_format::{post_count, CheckFormat, IndexFormat, ListFormat};
use postbook_ops::{
    CheckOptions, CheckOutcome, IndexOptions, IndexOutcome, ListOptions, ListOutcome,
    OperationError, Operations, ScanOptions,
};
use tracing::debug;

/// Exit code for configuration failures.
const CONFIG_EXIT_CODE: i32 = 2;

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let mut load_options = LoadOptions::default();
    if let Some(path) = &cli.config {
        load_options = load_options.with_override_path(path);
    }

    let config = match Config::load(load_options) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("postbook: {err}");
            return Ok(CONFIG_EXIT_CODE);
        }
    };
    let ops = Operations::new(config);
    debug!(
        layers = ops.config().sources.layers.len(),
        collection = %ops.config().collection.dir.display(),
        "configuration resolved"
    );

    let result = match cli.command {
        Command::List(args) => handle_list(&ops, args),
        Command::Check(args) => handle_check(&ops, args),
        Command::Index(args) => handle_index(&ops, args),
    };

    match result {
        Ok(code) => Ok(code),
        Err(err) => {
            eprintln!("postbook: {err}");
            Ok(err.exit_code())
        }
    }
}

fn handle_list(ops: &Operations, args: ListArgs) -> Result<i32, OperationError> {
    let ListArgs {
        dir,
        format,
        no_ignore,
    } = args;

    let format = match format.unwrap_or(ListFormatValue::Plain) {
        ListFormatValue::Plain => ListFormat::Plain,
        ListFormatValue::Json => ListFormat::Json,
    };

    let options = ListOptions {
        scan: scan_options(dir, no_ignore),
        format,
    };
    let ListOutcome { rendered, .. } = ops.list(options)?;

    emit(&rendered);
    Ok(0)
}

fn handle_check(ops: &Operations, args: CheckArgs) -> Result<i32, OperationError> {
    let CheckArgs {
        dir,
        format,
        no_ignore,
        quiet,
    } = args;

    let format = match format.unwrap_or(CheckFormatValue::Plain) {
        CheckFormatValue::Plain => CheckFormat::Plain,
        CheckFormatValue::Json => CheckFormat::Json,
    };

    let options = CheckOptions {
        scan: scan_options(dir, no_ignore),
        format,
    };
    let CheckOutcome {
        rendered,
        exit_code,
        ..
    } = ops.check(options)?;

    if !(quiet && exit_code == 0) {
        emit(&rendered);
    }
    Ok(exit_code)
}

fn handle_index(ops: &Operations, args: IndexArgs) -> Result<i32, OperationError> {
    let IndexArgs {
        dir,
        format,
        output,
        stdout,
        no_ignore,
    } = args;

    let format = match format.unwrap_or(IndexFormatValue::Markdown) {
        IndexFormatValue::Markdown => IndexFormat::Markdown,
        IndexFormatValue::Json => IndexFormat::Json,
    };

    let options = IndexOptions {
        scan: scan_options(dir, no_ignore),
        format,
        output_path: output,
        write_to_disk: !stdout,
    };
    let IndexOutcome {
        rendered,
        written_to,
        post_count: posts,
    } = ops.index(options)?;

    match written_to {
        Some(path) => println!("Wrote {} to {}", post_count(posts), path.display()),
        None => emit(&rendered),
    }
    Ok(0)
}

fn scan_options(dir: Option<PathBuf>, no_ignore: bool) -> ScanOptions {
    ScanOptions {
        directory: dir,
        respect_ignore: !no_ignore,
    }
}

fn emit(content: &str) {
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
}

fn init_tracing(verbose: u8, log_format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => "postbook=warn",
        1 => "postbook=info",
        2 => "postbook=debug",
        _ => "postbook=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Collect Jekyll-style Markdown posts",
    propagate_version = true
)]
struct Cli {
    /// Use this config file on top of the discovered ones
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log format written to stderr
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List posts in collection order
    List(ListArgs),
    /// Parse every post and report malformed front matter
    Check(CheckArgs),
    /// Generate the post index
    Index(IndexArgs),
}

#[derive(Args)]
struct ListArgs {
    /// Collection directory (defaults to `collection.dir`)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Output format (plain or json)
    #[arg(long, value_enum)]
    format: Option<ListFormatValue>,

    /// Disable `.postbook-ignore` and `.gitignore` filtering
    #[arg(long = "no-ignore")]
    no_ignore: bool,
}

#[derive(Args)]
struct CheckArgs {
    /// Collection directory (defaults to `collection.dir`)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Output format (plain or json)
    #[arg(long, value_enum)]
    format: Option<CheckFormatValue>,

    /// Disable `.postbook-ignore` and `.gitignore` filtering
    #[arg(long = "no-ignore")]
    no_ignore: bool,

    /// Print nothing when every post parses
    #[arg(long)]
    quiet: bool,
}

#[derive(Args)]
struct IndexArgs {
    /// Collection directory (defaults to `collection.dir`)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Output format (markdown or json)
    #[arg(long, value_enum)]
    format: Option<IndexFormatValue>,

    /// Override index output path (markdown only)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Print the index instead of writing it
    #[arg(long)]
    stdout: bool,

    /// Disable `.postbook-ignore` and `.gitignore` filtering
    #[arg(long = "no-ignore")]
    no_ignore: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ListFormatValue {
    Plain,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum CheckFormatValue {
    Plain,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum IndexFormatValue {
    Markdown,
    Json,
}
