//! orgpulse: monthly engineering digests from repository history
//!
//! Syncs each configured repository, collects the commits made by the
//! organization within the lookback window, and prints the article to stdout.
//! Logs go to stderr so the article can be piped.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use orgpulse::config::{Config, DEFAULT_REPORT_FILE};
use orgpulse::pipeline::Pipeline;
use orgpulse::prompt;
use orgpulse::report::{ReportAssembler, save_article};
use orgpulse::summarize::OpenAiSummarizer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let config = Config::parse();
    init_tracing(&config);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &Config) {
    // RUST_LOG wins over -v/-q
    let filter = EnvFilter::builder()
        .with_default_directive(config.log_level().into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(config: &Config) -> Result<()> {
    let mut prompter = prompt::for_terminal(config.no_input);
    let resolved = config
        .resolve(prompter.as_mut())
        .context("Failed to resolve configuration")?;

    let report = Pipeline::new()
        .run(&resolved.run)
        .context("Commit analysis failed")?;

    let summarizer = resolved
        .summarizer
        .clone()
        .map(OpenAiSummarizer::new)
        .transpose()
        .context("Failed to set up the summarizer")?;
    let mut assembler = ReportAssembler::new();
    if let Some(summarizer) = summarizer.as_ref() {
        info!(model = %summarizer.config().model, "Contributor summaries enabled");
        assembler = assembler.with_summarizer(summarizer);
    }

    let article = assembler
        .render(&report, resolved.format)
        .context("Failed to render report")?;
    println!("{article}");

    let destination = resolved.save_to_file.clone().or_else(|| {
        if prompter.is_interactive() {
            prompt::ask_save_path(prompter.as_mut(), DEFAULT_REPORT_FILE).map(PathBuf::from)
        } else {
            None
        }
    });
    if let Some(path) = destination {
        // The article is already on stdout; a failed save only warns
        save_article(&path, &article);
    }

    Ok(())
}
