//! Command dispatch logic for promise-similarity

use std::time::Instant;

use promise_similarity_core::config::PipelineConfig;
use promise_similarity_core::error::Result;
use promise_similarity_core::pipeline::{Executor, Invalidation};
use tracing::debug;

use crate::cli::{Cli, Commands, RunArgs, StageArgs};

/// Shared context for command execution
pub struct CommandContext<'a> {
    pub cli: &'a Cli,
    pub start: Instant,
}

impl<'a> CommandContext<'a> {
    pub fn new(cli: &'a Cli, start: Instant) -> Self {
        Self { cli, start }
    }

    /// Config file, then environment, then the flags in `args`
    pub fn load_config(&self, args: &StageArgs) -> Result<PipelineConfig> {
        let mut config =
            PipelineConfig::load(self.cli.config.as_deref(), self.cli.data_dir.as_deref())?;

        if let Some(dir) = &self.cli.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(path) = &args.obt_path {
            config.obt_path = path.clone();
        }
        if let Some(threshold) = args.threshold {
            config.similarity.threshold = threshold;
        }

        debug!(elapsed = ?self.start.elapsed(), data_dir = %config.data_dir.display(), "load_config");
        Ok(config)
    }

    /// Executor for `config` with the `--no-cache` stages invalidated
    pub fn executor(&self, config: PipelineConfig, args: &StageArgs) -> Result<Executor> {
        let invalidation = Invalidation::from_names(&args.no_cache)?;
        config.validate()?;
        Ok(Executor::from_config(config, invalidation))
    }
}

/// Trait for commands that can be executed
pub trait Command {
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

impl Command for Commands {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Commands::Run(args) => super::run::execute(ctx, args),
            Commands::Details(args) => super::details::execute(ctx, args),
        }
    }
}

pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    let ctx = CommandContext::new(cli, start);

    match &cli.command {
        None => super::run::execute(&ctx, &RunArgs::default()),
        Some(cmd) => cmd.execute(&ctx),
    }
}
