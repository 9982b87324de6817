//! `details` command: one filtered detail report

use promise_similarity_core::config::DetailFilter;
use promise_similarity_core::error::Result;
use promise_similarity_core::pipeline::DetailSummary;
use serde::Serialize;

use super::dispatch::CommandContext;
use crate::cli::{DetailsArgs, OutputFormat};

#[derive(Serialize)]
struct DetailsOutput<'a> {
    filter: &'a DetailFilter,
    report: &'a DetailSummary,
}

pub fn execute(ctx: &CommandContext, args: &DetailsArgs) -> Result<()> {
    let config = ctx.load_config(&args.stages)?;
    let filter = DetailFilter {
        promisor: args.promisor.clone(),
        compare: args.compare.clone(),
        periods: args.period.clone(),
    };

    let executor = ctx.executor(config, &args.stages)?;
    let report = executor.run_details(&filter)?;

    match ctx.cli.format {
        OutputFormat::Json => {
            let output = DetailsOutput {
                filter: &filter,
                report: &report,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if report.rows == 0 && !ctx.cli.quiet {
                eprintln!("No matches for {}", filter.promisor);
            }
            println!("{}", report.path.display());
        }
    }

    Ok(())
}
