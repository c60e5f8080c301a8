// Copyright (c) 2026 - present orgpulse contributors
// SPDX-License-Identifier: MIT

//! Working-copy access and commit extraction
//!
//! This module wraps a `git2` repository with the two operations the report
//! needs: pulling the current branch from `origin` and walking its history to
//! collect the commits attributed to an organization.

use crate::commit::CommitRecord;
use crate::error::{ExtractError, GitError};
use chrono::{DateTime, TimeDelta, Utc};
use git2::build::CheckoutBuilder;
use git2::{Cred, CredentialType, ErrorCode, FetchOptions, RemoteCallbacks, Repository, Sort};
use std::path::Path;
use tracing::{debug, info};

/// Days counted per month of lookback
pub const DAYS_PER_MONTH: i64 = 30;

/// Credential callbacks give up after this many tries to avoid libgit2 retry loops
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// Start of the lookback window: `now` minus `months_back` × 30 days
///
/// Months are a fixed 30 days, not calendar months. A window too large for
/// the calendar clamps to the earliest representable instant.
#[must_use]
pub fn lookback_start(now: DateTime<Utc>, months_back: u32) -> DateTime<Utc> {
    TimeDelta::try_days(i64::from(months_back) * DAYS_PER_MONTH)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Case-insensitive substring test of `org_identifier` against name OR email
#[must_use]
pub fn matches_organization(author_name: &str, author_email: &str, org_identifier: &str) -> bool {
    let needle = org_identifier.to_lowercase();
    author_name.to_lowercase().contains(&needle) || author_email.to_lowercase().contains(&needle)
}

/// Configuration for extracting commits
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Only include commits authored at or after this instant
    pub since: DateTime<Utc>,
    /// Substring matched against author name or email
    pub org_identifier: String,
    /// Maximum number of matching commits to keep
    pub limit: Option<usize>,
}

impl ExtractOptions {
    /// Create options for a window start and organization identifier
    #[must_use]
    pub fn new(since: DateTime<Utc>, org_identifier: impl Into<String>) -> Self {
        Self {
            since,
            org_identifier: org_identifier.into(),
            limit: None,
        }
    }

    /// Keep at most `n` matching commits
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

/// A local working copy
pub struct GitRepo {
    repo: Repository,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl GitRepo {
    /// Open the working copy at exactly `path`
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepositoryNotFound` if the path is not a git
    /// repository, or `GitError::Git2` if it is one but cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        match Repository::open(path) {
            Ok(repo) => Ok(Self { repo }),
            Err(e) if e.code() == ErrorCode::NotFound => Err(GitError::RepositoryNotFound {
                path: path.display().to_string(),
            }),
            Err(e) => Err(GitError::Git2(e)),
        }
    }

    /// Clone `url` into `path`
    ///
    /// # Errors
    ///
    /// Returns `GitError::Git2` if the clone fails.
    pub fn clone_from(url: &str, path: impl AsRef<Path>) -> Result<Self, GitError> {
        let repo = git2::build::RepoBuilder::new()
            .fetch_options(fetch_options())
            .clone(url, path.as_ref())?;
        Ok(Self { repo })
    }

    /// Get the `.git` directory path
    #[must_use]
    pub fn path(&self) -> &Path {
        self.repo.path()
    }

    /// Get the working directory path (None for bare repos)
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Display form of the working copy location
    fn location(&self) -> String {
        self.workdir().unwrap_or_else(|| self.path()).display().to_string()
    }

    /// Update the current branch from `origin` by fast-forward
    ///
    /// # Errors
    ///
    /// Returns `GitError::DetachedHead` when HEAD is not a branch,
    /// `GitError::Diverged` when the branch cannot be fast-forwarded, or
    /// `GitError::Git2` when fetching or checkout fails.
    pub fn pull(&self) -> Result<(), GitError> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(GitError::DetachedHead {
                path: self.location(),
            });
        }
        let (Some(refname), Some(branch)) = (head.name(), head.shorthand()) else {
            return Err(GitError::DetachedHead {
                path: self.location(),
            });
        };
        let refname = refname.to_string();
        let branch = branch.to_string();

        let mut remote = self.repo.find_remote("origin")?;
        remote.fetch(&[branch.as_str()], Some(&mut fetch_options()), None)?;

        let fetch_head = self.repo.find_reference("FETCH_HEAD")?;
        let fetch_commit = self.repo.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = self.repo.merge_analysis(&[&fetch_commit])?;

        if analysis.is_up_to_date() {
            debug!(branch = %branch, "Already up to date");
            return Ok(());
        }
        if !analysis.is_fast_forward() {
            return Err(GitError::Diverged { branch });
        }

        let mut reference = self.repo.find_reference(&refname)?;
        reference.set_target(fetch_commit.id(), "orgpulse: fast-forward pull")?;
        self.repo.set_head(&refname)?;
        self.repo
            .checkout_head(Some(CheckoutBuilder::default().force()))?;
        info!(branch = %branch, target = %fetch_commit.id(), "Fast-forwarded");
        Ok(())
    }

    /// Extract organization commits authored at or after `since`
    ///
    /// # Errors
    ///
    /// See [`GitRepo::extract_with`].
    pub fn extract(
        &self,
        since: DateTime<Utc>,
        org_identifier: &str,
    ) -> Result<Vec<CommitRecord>, ExtractError> {
        self.extract_with(&ExtractOptions::new(since, org_identifier))
    }

    /// Walk the current branch newest-first and collect matching commits
    ///
    /// Merge commits are skipped and never count toward the limit. The walk
    /// is ordered by commit time and stops once it reaches commits made
    /// before the window; commits authored before the window are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::HistoryUnavailable` if the history cannot be
    /// enumerated, or `ExtractError::Unexpected` for an empty repository or a
    /// commit whose timestamp cannot be represented. No partial result is
    /// returned on error.
    pub fn extract_with(&self, options: &ExtractOptions) -> Result<Vec<CommitRecord>, ExtractError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL)?;

        if self.repo.is_empty()? {
            return Err(ExtractError::Unexpected(
                "repository has no commits on its current branch".to_string(),
            ));
        }
        revwalk.push_head()?;

        let limit = options.limit.unwrap_or(usize::MAX);
        let mut commits = Vec::new();

        for oid_result in revwalk {
            if commits.len() >= limit {
                break;
            }

            let oid = oid_result?;
            let git_commit = self.repo.find_commit(oid)?;

            if git_commit.parent_count() > 1 {
                continue;
            }

            let committed_at = to_utc(git_commit.time().seconds(), oid)?;
            if committed_at < options.since {
                break;
            }

            let author = git_commit.author();
            let authored_at = to_utc(author.when().seconds(), oid)?;
            if authored_at < options.since {
                continue;
            }

            let author_name = String::from_utf8_lossy(author.name_bytes()).into_owned();
            let author_email = String::from_utf8_lossy(author.email_bytes()).into_owned();
            if !matches_organization(&author_name, &author_email, &options.org_identifier) {
                continue;
            }

            commits.push(CommitRecord {
                hash: oid.to_string(),
                author_name,
                author_email,
                timestamp: authored_at,
                message: String::from_utf8_lossy(git_commit.message_bytes())
                    .trim()
                    .to_string(),
            });
        }

        debug!(
            repo = %self.location(),
            matched = commits.len(),
            "Extracted commits"
        );
        Ok(commits)
    }
}

fn to_utc(seconds: i64, oid: git2::Oid) -> Result<DateTime<Utc>, ExtractError> {
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        ExtractError::Unexpected(format!("commit {oid} has an out-of-range timestamp"))
    })
}

/// Fetch options shared by clone and pull
///
/// Credentials come from ssh-agent or the configured git credential helper.
pub(crate) fn fetch_options<'cb>() -> FetchOptions<'cb> {
    let mut attempts = 0u32;
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username_from_url, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str(
                "authentication failed: no usable credentials",
            ));
        }
        credential_for(url, username_from_url, allowed)
    });

    let mut fo = FetchOptions::new();
    fo.remote_callbacks(callbacks);
    fo
}

/// Answer one credential request from libgit2
fn credential_for(
    url: &str,
    username_from_url: Option<&str>,
    allowed: CredentialType,
) -> Result<Cred, git2::Error> {
    let username = username_from_url.unwrap_or("git");
    // ssh URLs without a user ask for the name alone first
    if allowed.contains(CredentialType::USERNAME) {
        return Cred::username(username);
    }
    if allowed.contains(CredentialType::SSH_KEY) {
        return Cred::ssh_key_from_agent(username);
    }
    if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
        let config = git2::Config::open_default()?;
        return Cred::credential_helper(&config, url, username_from_url);
    }
    Cred::default()
}
