//! Command line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "sti",
    version,
    about = "Semantic table interpretation against a knowledge base",
    long_about = "Annotate a relational table with knowledge-base classes, entities and relations.\n\n\
                  The table is read from CSV (first record = headers) and the knowledge base from\n\
                  a JSON fixture of entities, types, attributes and class parents."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for humans, json for machines).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Interpret a table and write its annotation as JSON.
    Annotate(AnnotateArgs),

    /// Rank the subject column candidates of a table.
    DetectSubject(DetectArgs),
}

/// The table and its surrounding text.
#[derive(Args)]
pub struct TableArgs {
    /// CSV file; the first record holds the headers.
    #[arg(value_name = "TABLE_CSV")]
    pub table: PathBuf,

    /// Title of the page the table was taken from.
    #[arg(long = "title")]
    pub title: Option<String>,

    /// Table caption.
    #[arg(long = "caption")]
    pub caption: Option<String>,

    /// Free text around the table (repeatable).
    #[arg(long = "paragraph", value_name = "TEXT")]
    pub paragraphs: Vec<String>,

    /// User constraints as JSON.
    #[arg(long = "constraints", value_name = "PATH")]
    pub constraints: Option<PathBuf>,

    /// Interpreter configuration as TOML.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct AnnotateArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Knowledge base fixture (JSON).
    #[arg(long = "kb", value_name = "PATH")]
    pub kb: PathBuf,

    /// Write the annotation here instead of stdout.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print the summary table only.
    #[arg(long = "summary-only")]
    pub summary_only: bool,
}

#[derive(Args)]
pub struct DetectArgs {
    #[command(flatten)]
    pub table: TableArgs,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
