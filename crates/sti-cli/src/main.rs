//! `sti`: semantic table interpretation from the command line.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use sti_cli::logging::{LogConfig, LogFormat, init_logging};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_annotate, run_detect};
use crate::summary::{
    render_columns, render_relations, render_subject_ranking, subject_line, update_line,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match &cli.command {
        Command::Annotate(args) => match run_annotate(args) {
            Ok((table, report)) => {
                // Keep stdout clean for the annotation JSON.
                let to_stdout = args.summary_only || args.output.is_some();
                let mut lines = vec![
                    subject_line(&report),
                    update_line(&report),
                    render_columns(&table, &report),
                ];
                lines.extend(render_relations(&table, &report));
                for line in lines {
                    if to_stdout {
                        println!("{line}");
                    } else {
                        eprintln!("{line}");
                    }
                }
                0
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::DetectSubject(args) => match run_detect(args) {
            Ok((table, detection)) => {
                if detection.candidates.is_empty() {
                    println!("No subject column candidate.");
                } else {
                    println!("{}", render_subject_ranking(&table, &detection));
                }
                0
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}

fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
