// Copyright (c) 2026 - present orgpulse contributors
// SPDX-License-Identifier: MIT

//! Report rendering
//!
//! Turns a [`RunReport`] into the published Markdown article or into JSON.
//! Contributor summaries are added to the article when a [`Summarizer`] is
//! supplied; a failed summary is noted in place and never fails the article.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use orgpulse_git::CommitRecord;
use tracing::{debug, info, warn};

use crate::pipeline::{ReportOutcome, RepositoryReport, RunReport};
use crate::summarize::{SummaryRequest, Summarizer};

/// Rendering target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable article
    #[default]
    Markdown,
    /// Pretty-printed report structure
    Json,
}

/// Renders reports, optionally with contributor summaries
#[derive(Default)]
pub struct ReportAssembler<'a> {
    summarizer: Option<&'a dyn Summarizer>,
}

impl<'a> ReportAssembler<'a> {
    /// Assembler without summaries
    #[must_use]
    pub fn new() -> Self {
        Self { summarizer: None }
    }

    /// Add a contributor summary block to each repository with commits
    #[must_use]
    pub fn with_summarizer(mut self, summarizer: &'a dyn Summarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Render in the requested format
    ///
    /// # Errors
    ///
    /// Returns a serialization error for JSON output.
    pub fn render(&self, report: &RunReport, format: OutputFormat) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Markdown => Ok(self.markdown(report)),
            OutputFormat::Json => serde_json::to_string_pretty(report),
        }
    }

    /// Render the Markdown article
    #[must_use]
    pub fn markdown(&self, report: &RunReport) -> String {
        if report.repositories.is_empty() {
            return "No relevant commits found to generate an article.".to_string();
        }

        let months = report.months_back;
        let mut out = String::new();
        out.push_str(&format!(
            "# Recent Developments: A Look at Our Codebase ({months} {} Review)\n\n",
            month_word(months)
        ));
        out.push_str(&format!(
            "We're excited to share a summary of the significant progress made across our \
             repositories in the last {months} {}. Our team has been busy shipping new \
             features, refining existing functionality, and improving the stability of our \
             products.\n\n",
            month_word(months).to_lowercase()
        ));
        out.push_str("Here's a breakdown of key contributions by repository:\n\n");

        for repo in &report.repositories {
            self.repository_section(&mut out, repo, months);
        }

        out.push_str(
            "This overview highlights the continuous effort and innovation from our \
             development team. We look forward to bringing even more exciting updates in \
             the future!\n\n---\n*Generated by orgpulse*\n",
        );
        out
    }

    fn repository_section(&self, out: &mut String, repo: &RepositoryReport, months: u32) {
        out.push_str(&format!("## {}\n\n", repo.spec.name));
        out.push_str(&format!("Repository URL: {}\n\n", repo.spec.url));

        let commits = match &repo.outcome {
            ReportOutcome::Error(reason) => {
                out.push_str(&format!("**Error processing this repository:** {reason}\n\n"));
                return;
            }
            ReportOutcome::Commits(commits) if commits.is_empty() => {
                out.push_str(&format!(
                    "No company-specific commits were identified in this repository during \
                     the last {months} {}.\n\n",
                    month_word(months).to_lowercase()
                ));
                return;
            }
            ReportOutcome::Commits(commits) => commits,
        };

        out.push_str("Our team has made the following notable commits:\n\n");
        for commit in commits {
            out.push_str(&commit_line(commit));
        }
        out.push('\n');

        if let Some(summarizer) = self.summarizer {
            out.push_str("### Contributor summaries\n\n");
            for request in summary_requests(commits, months) {
                let text = match summarizer.summarize(&request) {
                    Ok(summary) => {
                        debug!(repo = %repo.spec.name, author = %request.author, "Summary received");
                        summary
                    }
                    Err(e) => {
                        warn!(repo = %repo.spec.name, author = %request.author, error = %e, "Summary failed");
                        format!("_Summary unavailable: {e}_")
                    }
                };
                out.push_str(&format!("**{}**: {text}\n\n", request.author));
            }
        }
    }
}

/// Write the rendered article to `path`
///
/// A failed write is logged and reported as `false`; the article has already
/// been printed, so the run still succeeds.
pub fn save_article(path: &Path, article: &str) -> bool {
    match fs::write(path, article) {
        Ok(()) => {
            info!(path = %path.display(), "Article saved");
            true
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to save article");
            false
        }
    }
}

fn commit_line(commit: &CommitRecord) -> String {
    let subject = match commit.subject().trim() {
        "" => "(No message)".to_string(),
        s => s.replace('_', r"\_"),
    };
    format!("- **{}** on {}: {subject}\n", commit.author_name, commit.date())
}

/// One request per author, in order of first appearance
fn summary_requests(commits: &[CommitRecord], months_back: u32) -> Vec<SummaryRequest> {
    let mut requests: Vec<SummaryRequest> = Vec::new();
    for commit in commits {
        match requests.iter_mut().find(|r| r.author == commit.author_name) {
            Some(request) => request.messages.push(commit.message.clone()),
            None => requests.push(SummaryRequest {
                author: commit.author_name.clone(),
                months_back,
                messages: vec![commit.message.clone()],
            }),
        }
    }
    requests
}

fn month_word(months: u32) -> &'static str {
    if months == 1 { "Month" } else { "Months" }
}
