//! CLI argument parsing for promise-similarity

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use promise_similarity_core::error::PromiseError;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Readable summary
    #[default]
    Human,
    /// Single JSON document on stdout
    Json,
}

/// Find related, duplicated and reused promises across party manifestos
#[derive(Parser, Debug)]
#[command(name = "promise-similarity")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the corpus and every derived artifact
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Config file (defaults to promise-similarity.toml in the data directory)
    #[arg(long, global = true, value_name = "FILE", env = "PROMISE_SIMILARITY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Log at debug level
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level or filter directive (e.g. `trace`, `promise_similarity_core=debug`)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline (the default when no command is given)
    Run(RunArgs),

    /// Write a detail report for one promisor
    Details(DetailsArgs),
}

/// Settings shared by every command that runs pipeline stages
#[derive(Args, Debug, Clone, Default)]
pub struct StageArgs {
    /// Path to the Oslo-Bergen-Tagger installation
    #[arg(short = 'o', long, value_name = "DIR")]
    pub obt_path: Option<PathBuf>,

    /// Stages to recompute even when cached (`all` for every stage)
    #[arg(short = 'n', long = "no-cache", value_name = "STAGE", num_args = 1..)]
    pub no_cache: Vec<String>,

    /// Promise similarity threshold
    #[arg(long, value_name = "SCORE")]
    pub threshold: Option<f64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub stages: StageArgs,

    /// Minimum score for a possible duplicate
    #[arg(long, value_name = "SCORE")]
    pub duplicate_threshold: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct DetailsArgs {
    #[command(flatten)]
    pub stages: StageArgs,

    /// Promisor whose promises are the report's sources
    #[arg(long)]
    pub promisor: String,

    /// Only keep matches from this promisor (repeatable)
    #[arg(long, value_name = "PROMISOR")]
    pub compare: Vec<String>,

    /// Only keep promises from this period (repeatable)
    #[arg(long, value_name = "PERIOD")]
    pub period: Vec<String>,
}

/// Whether raw arguments ask for JSON output. Used when clap rejects the
/// command line before `Cli::format` exists.
pub fn wants_json<I, S>(args: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<S> = args.into_iter().collect();
    args.iter().enumerate().any(|(i, arg)| match arg.as_ref() {
        "--format=json" => true,
        "--format" => args.get(i + 1).is_some_and(|next| next.as_ref() == "json"),
        _ => false,
    })
}

/// Error for a rejected command line, or `None` for help and version output
pub fn parse_error(err: &clap::Error) -> Option<PromiseError> {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => None,
        ErrorKind::ValueValidation
        | ErrorKind::InvalidValue
        | ErrorKind::InvalidSubcommand
        | ErrorKind::UnknownArgument
        | ErrorKind::MissingRequiredArgument
        | ErrorKind::ArgumentConflict => Some(PromiseError::UsageError(err.to_string())),
        _ => Some(PromiseError::Other(err.to_string())),
    }
}
