// Copyright (c) 2026 - present orgpulse contributors
// SPDX-License-Identifier: MIT

//! Error types for orgpulse-git

use thiserror::Error;

/// Errors that can occur during low-level git operations
#[derive(Debug, Error)]
pub enum GitError {
    /// Error from git2 library
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),

    /// Filesystem error around a working copy
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Repository not found at the specified path
    #[error("Repository not found: {path}")]
    RepositoryNotFound {
        /// The path that was searched for a repository
        path: String,
    },

    /// HEAD does not point at a local branch, so there is nothing to pull into
    #[error("HEAD is detached in {path}")]
    DetachedHead {
        /// Path of the working copy
        path: String,
    },

    /// Local and remote histories cannot be fast-forwarded
    #[error("Cannot fast-forward {branch}: local and remote histories have diverged")]
    Diverged {
        /// The branch that could not be updated
        branch: String,
    },
}

/// Errors reported by repository synchronization
///
/// Each variant carries a human-readable detail string that ends up in the
/// repository's section of the report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Cloning from scratch failed (network, auth, malformed URL, disk)
    #[error("Failed to clone: {0}")]
    Clone(String),

    /// A stale working copy could not be removed before re-cloning
    #[error("Failed to remove stale working copy: {0}")]
    Cleanup(String),

    /// Any other failure
    #[error("Unexpected error during sync: {0}")]
    Unexpected(String),
}

/// Errors reported by commit extraction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// Commit history could not be enumerated
    #[error("Failed to get commit log: {0}")]
    HistoryUnavailable(String),

    /// Any other failure while processing commits
    #[error("Error processing commits: {0}")]
    Unexpected(String),
}

impl From<GitError> for ExtractError {
    fn from(err: GitError) -> Self {
        Self::HistoryUnavailable(err.to_string())
    }
}

impl From<git2::Error> for ExtractError {
    fn from(err: git2::Error) -> Self {
        Self::HistoryUnavailable(err.message().to_string())
    }
}
