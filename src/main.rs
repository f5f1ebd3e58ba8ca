//! Command-line front end for the `safe_dom` library: renders JSON node-tree
//! documents to HTML files and keeps a per-run JSONL log. The document
//! format, output files and logs belong to this tool, not to the library.

mod cli;
mod config;
mod document;
mod logger;
mod pipeline;

use crate::cli::Cli;
use crate::config::RenderConfig;
use crate::pipeline::RenderPipeline;
use anyhow::{Context, Result};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.documents.is_empty() {
        eprintln!("Error: No documents provided. Use --documents to specify input files.");
        return Err(anyhow::anyhow!("No documents specified"));
    }

    let config = RenderConfig::new(cli.fail_fast, cli.max_log_builds, cli.doctype);
    let mut pipeline =
        RenderPipeline::new(config, &cli.log_dir).context("Failed to create render pipeline")?;

    println!("Rendering {} document(s)...", cli.documents.len());

    let out_dir = (!cli.validate_only).then_some(cli.out.as_path());
    let outcome = pipeline.run(&cli.documents, out_dir);

    // The summary is written even when a fail-fast run stops early.
    let summary = pipeline.finalize()?;
    outcome?;

    println!("Render complete!");
    println!("Run log: {}", pipeline.log.path().display());
    println!(
        "Documents: {}, Failures: {}, Warnings: {}",
        summary.stats.documents, summary.stats.failures, summary.warnings
    );

    if summary.stats.failures > 0 {
        return Err(anyhow::anyhow!(
            "{} document(s) failed to render",
            summary.stats.failures
        ));
    }

    Ok(())
}
