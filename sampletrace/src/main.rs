//! # sampletrace - Main Entry Point
//!
//! Supports two operational modes:
//! - **Report** (default): read a record file and write a text or binary report
//! - **Dump** (`--dump-protobuf-report <FILE>`): print a binary report as text
//!   and verify its file and symbol ids

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use sampletrace::cli::Args;
use sampletrace::dump::dump_report;
use sampletrace::profiling::generate_report;
use sampletrace::record::RecordFileReader;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<()> {
    let args = Args::parse();

    if let Some(ref report) = args.dump_protobuf_report {
        let output = open_output(args.output.as_deref())?;
        let file = File::open(report)
            .with_context(|| format!("Failed to open {}", report.display()))?;
        let summary = dump_report(BufReader::new(file), output)
            .with_context(|| format!("Failed to dump {}", report.display()))?;
        info!("{} is consistent ({} samples)", report.display(), summary.samples);
        return Ok(());
    }

    let reader = RecordFileReader::open(&args.input)
        .with_context(|| format!("Failed to read record file {}", args.input.display()))?;
    let output = open_output(args.output_path().as_deref())?;
    let summary = generate_report(reader, &args.report_options(), output)
        .with_context(|| format!("Failed to report {}", args.input.display()))?;
    info!(
        "Wrote {} samples, {} files, {} threads",
        summary.samples, summary.files, summary.threads
    );
    Ok(())
}

/// Report destination: the given file, or stdout
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            info!("Writing report to {}", path.display());
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}
