//! `run` command: the full pipeline

use chrono::SecondsFormat;
use promise_similarity_core::error::Result;
use promise_similarity_core::pipeline::{Outcome, RunSummary};

use super::dispatch::CommandContext;
use crate::cli::{OutputFormat, RunArgs};

pub fn execute(ctx: &CommandContext, args: &RunArgs) -> Result<()> {
    let mut config = ctx.load_config(&args.stages)?;
    if let Some(threshold) = args.duplicate_threshold {
        config.similarity.duplicate_threshold = threshold;
    }

    let executor = ctx.executor(config, &args.stages)?;
    let summary = executor.run()?;

    match ctx.cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Human => {
            if !ctx.cli.quiet {
                print_human(&summary);
            }
        }
    }

    Ok(())
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Cached => "cached",
        Outcome::Computed => "computed",
    }
}

fn print_human(summary: &RunSummary) {
    println!(
        "Run started {} in {}",
        summary
            .started_at
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        summary.data_dir.display()
    );
    println!(
        "Promises: {} in {} programs",
        summary.promises, summary.programs
    );
    println!(
        "Related promises: {} ({} pairs)",
        summary.similar_promises, summary.similarity_pairs
    );
    println!("Possible duplicates: {}", summary.duplicates);
    println!("Related programs: {}", summary.related_programs);
    println!("Reuse cells: {}", summary.reuse_cells);

    for detail in &summary.details {
        println!(
            "Detail report {}: {} rows",
            detail.path.display(),
            detail.rows
        );
    }

    println!();
    for report in &summary.stages {
        println!(
            "  {:<22} {:<9} {}",
            report.stage.name(),
            outcome_label(report.outcome),
            report.artifact.display()
        );
    }
}
