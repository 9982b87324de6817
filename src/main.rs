//! promise-similarity - related, duplicated and reused manifesto promises
//!
//! Downloads a promise corpus, lemmatizes it with the Oslo-Bergen-Tagger and
//! writes similarity, duplicate and reuse reports into a data directory.

mod cli;
mod commands;

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use cli::{Cli, OutputFormat};
use promise_similarity_core::error::PromiseError;
use promise_similarity_core::logging;

fn main() -> ExitCode {
    let start = Instant::now();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return report_parse_failure(err),
    };

    if let Err(e) = logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json) {
        eprintln!("warning: logging disabled: {}", e);
    }
    tracing::debug!(elapsed = ?start.elapsed(), "parse_args");

    match commands::dispatch::run(&cli, start) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e, cli.format, cli.quiet),
    }
}

/// Clap output stays as is unless `--format json` was on the command line
fn report_parse_failure(err: clap::Error) -> ExitCode {
    if !cli::wants_json(std::env::args().skip(1)) {
        err.exit()
    }

    match cli::parse_error(&err) {
        Some(error) => report(&error, OutputFormat::Json, false),
        None => err.exit(),
    }
}

fn report(error: &PromiseError, format: OutputFormat, quiet: bool) -> ExitCode {
    match format {
        OutputFormat::Json => eprintln!("{}", error.to_json()),
        OutputFormat::Human if !quiet => eprintln!("error: {}", error),
        OutputFormat::Human => {}
    }
    ExitCode::from(error.exit_code() as u8)
}
