//! bandforge: HFDL system table to JSON converter
//!
//! Parses arguments, installs the diagnostic subscriber for the run and
//! performs the conversion.

use anyhow::Result;
use bandforge::{convert, logging, Args};
use clap::Parser;
use std::time::Instant;
use tracing::debug;

fn main() -> Result<()> {
    let args = Args::parse();

    let dispatch = logging::dispatch(args.verbosity());
    tracing::dispatcher::with_default(&dispatch, || run(&args))
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();

    let summary = convert(&args.systable, &args.output)?;

    debug!(
        stations = summary.stations,
        bands = summary.bands,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "done"
    );
    Ok(())
}
