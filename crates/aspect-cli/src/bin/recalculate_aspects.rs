//! Recalculate wall aspects for a file of crag records.
//!
//! Records are sent to the aspect service in paced batches and the file is
//! rewritten with the new aspects and calculation methods.
//!
//! Usage:
//!   cargo run -p aspect-cli --bin recalculate_aspects -- crags.json
//!   cargo run -p aspect-cli --bin recalculate_aspects -- crags.json --missing-only

use anyhow::Result;
use aspect_cli::records::{by_name, load_records, merge_records, missing_aspect, save_records};
use aspect_cli::summary::{reference_line, summary_lines};
use aspect_cli::{init_tracing, ClientArgs};
use aspect_sdk::{
    validate_references, BatchPolicy, BatchRunner, REFERENCE_CRAGS, REFERENCE_TOLERANCE_DEG,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Recalculate crag aspects in paced batches")]
struct Args {
    /// JSON file holding an array of crag records
    records: PathBuf,

    /// Write results here instead of overwriting the input
    #[arg(long)]
    output: Option<PathBuf>,

    /// Only process crags without an aspect
    #[arg(long)]
    missing_only: bool,

    #[command(flatten)]
    client: ClientArgs,

    /// Crags per batch
    #[arg(long, default_value_t = 10)]
    batch_size: usize,

    /// Pause between batches in milliseconds
    #[arg(long, default_value_t = 2_000)]
    batch_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let mut records = load_records(&args.records)?;
    let mut pending = by_name(if args.missing_only {
        missing_aspect(&records)
    } else {
        records.clone()
    });

    if pending.is_empty() {
        println!("Nothing to do: no matching crags in {}", args.records.display());
        return Ok(());
    }

    let with_geometry = pending
        .iter()
        .filter(|crag| crag.usable_geometry().is_some())
        .count();
    println!("Found {} crags to recalculate", pending.len());
    println!("  {} with wall geometry", with_geometry);
    println!("  {} using elevation data", pending.len() - with_geometry);

    let runner = BatchRunner::new(
        args.client.client(),
        BatchPolicy {
            batch_size: args.batch_size,
            inter_batch_delay: Duration::from_millis(args.batch_delay_ms),
        },
    );
    let report = runner.run(&mut pending).await;
    merge_records(&mut records, pending);

    let output = args.output.as_ref().unwrap_or(&args.records);
    save_records(output, &records)?;

    println!();
    println!("{}", "=".repeat(70));
    for line in summary_lines(&report) {
        println!("{line}");
    }
    println!(
        "Elapsed: {}s",
        (report.finished_at - report.started_at).num_seconds()
    );
    println!("{}", "=".repeat(70));

    if args.missing_only {
        println!(
            "Crags still missing aspect data: {}",
            missing_aspect(&records).len()
        );
    }

    println!();
    println!("Reference crags:");
    for check in validate_references(&records, &REFERENCE_CRAGS, REFERENCE_TOLERANCE_DEG) {
        println!("  {}", reference_line(&check));
    }
    println!("Results written to {}", output.display());
    Ok(())
}
