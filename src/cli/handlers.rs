//! Command handlers
//!
//! Thin orchestration between parsed CLI arguments and the library: run the
//! search, format the output, map failures to exit codes. Fatal errors are
//! printed to stderr with their full context chain.

use crate::cli::commands::{GenerateArgs, ResolveArgs};
use crate::cli::output::OutputFormatter;
use crate::descriptor::generate_descriptors;
use crate::search::search;
use anyhow::{Context, Result};
use tracing::error;

/// Handles `modlink resolve`.
pub async fn handle_resolve(args: &ResolveArgs) -> i32 {
    match run_resolve(args).await {
        Ok(output) => {
            println!("{output}");
            0
        }
        Err(err) => {
            error!("{err:#}");
            1
        }
    }
}

/// Handles `modlink generate`.
pub async fn handle_generate(args: &GenerateArgs) -> i32 {
    match run_generate(args).await {
        Ok(()) => 0,
        Err(err) => {
            error!("{err:#}");
            1
        }
    }
}

async fn run_resolve(args: &ResolveArgs) -> Result<String> {
    let options = args.search.to_options();
    let results = search(&options)
        .await
        .context("module resolution failed")?;
    OutputFormatter::new(args.output_format()).format_results(&results)
}

async fn run_generate(args: &GenerateArgs) -> Result<()> {
    let options = args.search.to_options();
    let results = search(&options)
        .await
        .context("module resolution failed")?;
    let descriptors = generate_descriptors(&results, options.platform, &options.flags);
    let output = OutputFormatter::new(args.format).format_descriptors(&descriptors)?;

    match &args.output {
        Some(path) => tokio::fs::write(path, output.as_bytes())
            .await
            .with_context(|| format!("failed to write output to {}", path.display()))?,
        None => println!("{output}"),
    }
    Ok(())
}
