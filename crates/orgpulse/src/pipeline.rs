// Copyright (c) 2026 - present orgpulse contributors
// SPDX-License-Identifier: MIT

//! Repository pipeline
//!
//! This module drives synchronization and extraction over the configured
//! repositories, one at a time and in input order, and collects one report
//! entry per repository whether or not its stages succeeded.
//!
//! # Example
//!
//! ```no_run
//! use orgpulse::pipeline::{Pipeline, RunConfig};
//!
//! let config = RunConfig::new(
//!     vec!["https://github.com/acme/widgets.git".to_string()],
//!     "acme.io",
//!     1,
//!     "deploy",
//! );
//! let report = Pipeline::new().run(&config).expect("run pipeline");
//! println!("{} repositories analyzed", report.repositories.len());
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use orgpulse_git::{
    CommitRecord, ExtractError, ExtractOptions, Git2Backend, GitRepo, RepoSync, RepositorySpec,
    SyncOutcome, VcsBackend, lookback_start,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

// ============================================================================
// Error Types
// ============================================================================

/// Run-level errors, raised before any repository is processed
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The run configuration is unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The deploy directory could not be created
    #[error("Failed to create deploy directory {0}: {1}")]
    DeployDir(PathBuf, std::io::Error),

    /// The temporary staging directory could not be created
    #[error("Failed to create staging directory: {0}")]
    Staging(std::io::Error),
}

// ============================================================================
// Configuration
// ============================================================================

/// A fully resolved, validated description of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Remote URLs, in report order
    pub repo_urls: Vec<String>,
    /// Substring matched against author name or email
    pub org_identifier: String,
    /// Lookback window in 30-day months
    pub months_back: u32,
    /// Directory holding working copies between runs
    pub deploy_dir: PathBuf,
    /// Maximum commits kept per repository
    pub limit: Option<usize>,
    /// Clone into a temporary directory removed at the end of the run
    pub ephemeral: bool,
}

impl RunConfig {
    /// Create a configuration with no limit and persistent working copies
    #[must_use]
    pub fn new(
        repo_urls: Vec<String>,
        org_identifier: impl Into<String>,
        months_back: u32,
        deploy_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repo_urls,
            org_identifier: org_identifier.into(),
            months_back,
            deploy_dir: deploy_dir.into(),
            limit: None,
            ephemeral: false,
        }
    }

    /// Reject inputs that would produce a misleading report
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidInput` for an empty URL list, a blank
    /// organization identifier, or a zero-month window.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.repo_urls.is_empty() {
            return Err(PipelineError::InvalidInput(
                "no repository URLs provided".to_string(),
            ));
        }
        if let Some(blank) = self.repo_urls.iter().find(|u| u.trim().is_empty()) {
            return Err(PipelineError::InvalidInput(format!(
                "blank repository URL {blank:?}"
            )));
        }
        if self.org_identifier.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "organization identifier cannot be empty".to_string(),
            ));
        }
        if self.months_back == 0 {
            return Err(PipelineError::InvalidInput(
                "months back must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Report Types
// ============================================================================

/// What a repository produced: its matching commits or why it has none
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOutcome {
    /// Matching commits, newest first
    Commits(Vec<CommitRecord>),
    /// Reason the repository could not be analyzed
    Error(String),
}

/// One repository's entry in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryReport {
    /// Which repository this is
    #[serde(flatten)]
    pub spec: RepositorySpec,
    /// Commits or error
    #[serde(flatten)]
    pub outcome: ReportOutcome,
}

impl RepositoryReport {
    /// Create a report entry
    #[must_use]
    pub fn new(spec: RepositorySpec, outcome: ReportOutcome) -> Self {
        Self { spec, outcome }
    }

    /// Matching commits (empty when the repository failed)
    #[must_use]
    pub fn commits(&self) -> &[CommitRecord] {
        match &self.outcome {
            ReportOutcome::Commits(commits) => commits,
            ReportOutcome::Error(_) => &[],
        }
    }

    /// Failure reason, if any
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ReportOutcome::Commits(_) => None,
            ReportOutcome::Error(reason) => Some(reason),
        }
    }
}

/// Everything a run produced, handed to the renderers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Organization identifier used for filtering
    pub organization: String,
    /// Lookback window in months
    pub months_back: u32,
    /// Start of the lookback window
    pub since: DateTime<Utc>,
    /// When the run started
    pub generated_at: DateTime<Utc>,
    /// One entry per input URL, in input order
    pub repositories: Vec<RepositoryReport>,
}

impl RunReport {
    /// Total matching commits across all repositories
    #[must_use]
    pub fn total_commits(&self) -> usize {
        self.repositories.iter().map(|r| r.commits().len()).sum()
    }

    /// Number of repositories that failed
    #[must_use]
    pub fn failed_repositories(&self) -> usize {
        self.repositories
            .iter()
            .filter(|r| r.error().is_some())
            .count()
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Sequential sync-then-extract driver
#[derive(Debug, Clone, Default)]
pub struct Pipeline<B = Git2Backend> {
    sync: RepoSync<B>,
}

impl Pipeline<Git2Backend> {
    /// Pipeline using libgit2
    #[must_use]
    pub fn new() -> Self {
        Self {
            sync: RepoSync::git2(),
        }
    }
}

impl<B: VcsBackend> Pipeline<B> {
    /// Pipeline over a custom version-control backend
    #[must_use]
    pub fn with_backend(backend: B) -> Self {
        Self {
            sync: RepoSync::new(backend),
        }
    }

    /// Run with the window anchored at the current time
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run_at`].
    pub fn run(&self, config: &RunConfig) -> Result<RunReport, PipelineError> {
        self.run_at(config, Utc::now())
    }

    /// Run with the window anchored at `now`
    ///
    /// Individual repository failures never abort the run; they become error
    /// entries in the report.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` when the configuration is invalid or the
    /// working-copy root cannot be created.
    pub fn run_at(&self, config: &RunConfig, now: DateTime<Utc>) -> Result<RunReport, PipelineError> {
        config.validate()?;

        // Dropping the guard removes the staging directory on every exit path
        let staging = if config.ephemeral {
            let dir = tempfile::Builder::new()
                .prefix("orgpulse-")
                .tempdir()
                .map_err(PipelineError::Staging)?;
            debug!(path = %dir.path().display(), "Using ephemeral staging directory");
            Some(dir)
        } else {
            fs::create_dir_all(&config.deploy_dir)
                .map_err(|e| PipelineError::DeployDir(config.deploy_dir.clone(), e))?;
            None
        };
        let root = staging
            .as_ref()
            .map_or(config.deploy_dir.as_path(), tempfile::TempDir::path);

        let since = lookback_start(now, config.months_back);
        let mut options = ExtractOptions::new(since, config.org_identifier.trim());
        if let Some(limit) = config.limit {
            options = options.limit(limit);
        }

        info!(
            repositories = config.repo_urls.len(),
            since = %since.to_rfc3339(),
            organization = %options.org_identifier,
            "Starting analysis"
        );

        let mut used_dirs = HashSet::new();
        let mut repositories = Vec::with_capacity(config.repo_urls.len());

        for url in &config.repo_urls {
            let spec = RepositorySpec::from_url(url.trim());
            let path = root.join(unique_dir_name(&spec.name, &mut used_dirs));

            info!(repo = %spec.name, url = %spec.url, path = %path.display(), "Processing repository");
            let outcome = self.sync.sync_outcome(&spec.url, &path);
            let outcome = extract_stage(&spec, outcome, &options);
            repositories.push(RepositoryReport::new(spec, outcome));
        }

        let report = RunReport {
            organization: options.org_identifier,
            months_back: config.months_back,
            since,
            generated_at: now,
            repositories,
        };
        info!(
            commits = report.total_commits(),
            failed = report.failed_repositories(),
            "Analysis complete"
        );
        Ok(report)
    }
}

/// Turn a sync outcome into the repository's report outcome
fn extract_stage(spec: &RepositorySpec, outcome: SyncOutcome, options: &ExtractOptions) -> ReportOutcome {
    let path = match outcome {
        SyncOutcome::Ready(path) => path,
        SyncOutcome::Failed(e) => {
            warn!(repo = %spec.name, error = %e, "Sync failed");
            return ReportOutcome::Error(e.to_string());
        }
    };

    match extract_commits(&path, options) {
        Ok(commits) => {
            info!(repo = %spec.name, commits = commits.len(), "Extracted commits");
            ReportOutcome::Commits(commits)
        }
        Err(e) => {
            warn!(repo = %spec.name, error = %e, "Extraction failed");
            ReportOutcome::Error(e.to_string())
        }
    }
}

fn extract_commits(path: &Path, options: &ExtractOptions) -> Result<Vec<CommitRecord>, ExtractError> {
    GitRepo::open(path)?.extract_with(options)
}

/// Directory name for a repository, suffixed when two URLs share a name
fn unique_dir_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{name}-{n}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    fn config() -> RunConfig {
        RunConfig::new(
            vec!["https://example.com/acme/widgets.git".to_string()],
            "acme",
            1,
            "deploy",
        )
    }

    fn sample_commit() -> CommitRecord {
        CommitRecord {
            hash: "a".repeat(40),
            author_name: "Dev".to_string(),
            author_email: "dev@acme.io".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 17, 12, 0, 0).unwrap(),
            message: "Add widget".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_url_list() {
        let config = RunConfig {
            repo_urls: vec![],
            ..config()
        };
        assert!(matches!(config.validate(), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_blank_url() {
        let config = RunConfig {
            repo_urls: vec!["  ".to_string()],
            ..config()
        };
        assert!(matches!(config.validate(), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_blank_identifier() {
        let config = RunConfig {
            org_identifier: "   ".to_string(),
            ..config()
        };
        assert!(matches!(config.validate(), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_zero_months() {
        let config = RunConfig {
            months_back: 0,
            ..config()
        };
        assert!(matches!(config.validate(), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_config_touches_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let deploy = dir.path().join("deploy");
        let config = RunConfig {
            months_back: 0,
            deploy_dir: deploy.clone(),
            ..config()
        };
        assert!(Pipeline::new().run(&config).is_err());
        assert!(!deploy.exists());
    }

    #[test]
    fn test_unique_dir_name_suffixes_duplicates() {
        let mut used = HashSet::new();
        assert_eq!(unique_dir_name("widgets", &mut used), "widgets");
        assert_eq!(unique_dir_name("widgets", &mut used), "widgets-2");
        assert_eq!(unique_dir_name("widgets", &mut used), "widgets-3");
        assert_eq!(unique_dir_name("gadgets", &mut used), "gadgets");
    }

    #[test]
    fn test_report_serializes_commits_shape() {
        let report = RepositoryReport::new(
            RepositorySpec::from_url("https://example.com/acme/widgets.git"),
            ReportOutcome::Commits(vec![sample_commit()]),
        );
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["repo_name"], "widgets");
        assert_eq!(json["repo_url"], "https://example.com/acme/widgets.git");
        assert_eq!(json["commits"][0]["author_email"], "dev@acme.io");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_report_serializes_error_shape() {
        let report = RepositoryReport::new(
            RepositorySpec::from_url("https://example.com/acme/widgets.git"),
            ReportOutcome::Error("Failed to clone: host unreachable".to_string()),
        );
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["error"], "Failed to clone: host unreachable");
        assert!(json.get("commits").is_none());
        assert!(report.commits().is_empty());
    }

    #[test]
    fn test_run_report_totals() {
        let report = RunReport {
            organization: "acme".to_string(),
            months_back: 1,
            since: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            generated_at: Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap(),
            repositories: vec![
                RepositoryReport::new(
                    RepositorySpec::from_url("https://example.com/a.git"),
                    ReportOutcome::Commits(vec![sample_commit(), sample_commit()]),
                ),
                RepositoryReport::new(
                    RepositorySpec::from_url("https://example.com/b.git"),
                    ReportOutcome::Error("boom".to_string()),
                ),
            ],
        };
        assert_eq!(report.total_commits(), 2);
        assert_eq!(report.failed_repositories(), 1);
    }
}
