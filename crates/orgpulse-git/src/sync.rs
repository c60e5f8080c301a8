// Copyright (c) 2026 - present orgpulse contributors
// SPDX-License-Identifier: MIT

//! Working-copy synchronization
//!
//! A working copy is kept between runs and updated with a pull. When the pull
//! fails the directory is removed and the repository is cloned again, so a
//! corrupted or diverged copy heals on the next run instead of failing forever.

use crate::error::{GitError, SyncError};
use crate::repo::GitRepo;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The version-control operations the sync policy is built on
pub trait VcsBackend {
    /// Open the working copy at `path`, or `Ok(None)` if there is none
    ///
    /// # Errors
    ///
    /// Returns an error when the path holds a repository that cannot be opened.
    fn open(&self, path: &Path) -> Result<Option<GitRepo>, GitError>;

    /// Update the working copy from its remote
    ///
    /// # Errors
    ///
    /// Returns an error when the remote is unreachable or histories diverged.
    fn pull(&self, repo: &GitRepo) -> Result<(), GitError>;

    /// Clone `url` into `path`
    ///
    /// # Errors
    ///
    /// Returns an error when the clone fails.
    fn clone_into(&self, url: &str, path: &Path) -> Result<GitRepo, GitError>;

    /// Delete the working copy directory tree
    ///
    /// # Errors
    ///
    /// Returns the filesystem error when removal fails.
    fn remove_working_copy(&self, path: &Path) -> std::io::Result<()> {
        fs::remove_dir_all(path)
    }
}

/// Backend using libgit2
#[derive(Debug, Clone, Copy, Default)]
pub struct Git2Backend;

impl VcsBackend for Git2Backend {
    fn open(&self, path: &Path) -> Result<Option<GitRepo>, GitError> {
        match GitRepo::open(path) {
            Ok(repo) => Ok(Some(repo)),
            Err(GitError::RepositoryNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn pull(&self, repo: &GitRepo) -> Result<(), GitError> {
        repo.pull()
    }

    fn clone_into(&self, url: &str, path: &Path) -> Result<GitRepo, GitError> {
        GitRepo::clone_from(url, path)
    }
}

/// Result of synchronizing one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Working copy is current at this path
    Ready(PathBuf),
    /// Synchronization failed
    Failed(SyncError),
}

impl SyncOutcome {
    /// Path of the working copy, if ready
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Ready(path) => Some(path),
            Self::Failed(_) => None,
        }
    }
}

/// Pull-first, re-clone-on-failure synchronization
#[derive(Debug, Clone, Default)]
pub struct RepoSync<B = Git2Backend> {
    backend: B,
}

impl RepoSync<Git2Backend> {
    /// Synchronizer backed by libgit2
    #[must_use]
    pub fn git2() -> Self {
        Self {
            backend: Git2Backend,
        }
    }
}

impl<B: VcsBackend> RepoSync<B> {
    /// Synchronizer over a custom backend
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get the backend
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Make `local_path` a current working copy of `remote_url`
    ///
    /// 1. An existing working copy is pulled.
    /// 2. If the pull fails, or the directory cannot be opened as a
    ///    repository, the directory is removed.
    /// 3. Without a working copy, `remote_url` is cloned into `local_path`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Cleanup` if a stale copy cannot be removed (no clone
    /// is attempted), `SyncError::Clone` if cloning fails, and
    /// `SyncError::Unexpected` if the existing path cannot be inspected.
    pub fn sync(&self, remote_url: &str, local_path: impl AsRef<Path>) -> Result<GitRepo, SyncError> {
        let path = local_path.as_ref();

        match self.backend.open(path) {
            Ok(Some(repo)) => {
                info!(path = %path.display(), "Existing working copy found, pulling");
                match self.backend.pull(&repo) {
                    Ok(()) => return Ok(repo),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Pull failed, re-cloning");
                        drop(repo);
                        self.remove_stale(path)?;
                    }
                }
            }
            Ok(None) => {
                debug!(path = %path.display(), "No working copy present");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Working copy unusable, re-cloning");
                self.remove_stale(path)?;
            }
        }

        self.clone_fresh(remote_url, path)
    }

    /// Synchronize and report only where the working copy ended up
    pub fn sync_outcome(&self, remote_url: &str, local_path: impl AsRef<Path>) -> SyncOutcome {
        let path = local_path.as_ref();
        match self.sync(remote_url, path) {
            Ok(repo) => SyncOutcome::Ready(
                repo.workdir()
                    .map_or_else(|| path.to_path_buf(), Path::to_path_buf),
            ),
            Err(e) => SyncOutcome::Failed(e),
        }
    }

    fn remove_stale(&self, path: &Path) -> Result<(), SyncError> {
        let exists = path
            .try_exists()
            .map_err(|e| SyncError::Unexpected(format!("{}: {e}", path.display())))?;
        if exists {
            self.backend
                .remove_working_copy(path)
                .map_err(|e| SyncError::Cleanup(format!("{}: {e}", path.display())))?;
            debug!(path = %path.display(), "Removed stale working copy");
        }
        Ok(())
    }

    fn clone_fresh(&self, remote_url: &str, path: &Path) -> Result<GitRepo, SyncError> {
        info!(url = %remote_url, path = %path.display(), "Cloning repository");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| SyncError::Clone(format!("{}: {e}", parent.display())))?;
        }

        let repo = self
            .backend
            .clone_into(remote_url, path)
            .map_err(|e| SyncError::Clone(e.to_string()))?;
        info!(path = %path.display(), "Repository cloned");
        Ok(repo)
    }
}
