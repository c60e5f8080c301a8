// Copyright (c) 2026 - present orgpulse contributors
// SPDX-License-Identifier: MIT

//! Test utilities for orgpulse integration tests
//!
//! "Remote" repositories live in temporary directories and are cloned by path.

#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, Utc};
use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};
use std::cell::Cell;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Instant `n` days before now, truncated to whole seconds
pub fn days_ago(n: i64) -> DateTime<Utc> {
    let then = Utc::now() - TimeDelta::days(n);
    DateTime::from_timestamp(then.timestamp(), 0).expect("valid timestamp")
}

/// A repository on disk acting as a clone source
pub struct RemoteRepo {
    repo: Repository,
    files: Cell<u32>,
    _dir: TempDir,
}

impl RemoteRepo {
    /// Empty repository on branch `main`
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).expect("Failed to init repo");
        Self {
            repo,
            files: Cell::new(0),
            _dir: dir,
        }
    }

    /// Repository holding the mixed history used by end-to-end checks
    ///
    /// Three in-window non-merge commits (two from acme), two in-window
    /// merges, one acme commit outside a one-month window.
    pub fn scenario() -> Self {
        let remote = Self::new();
        let c0 = remote.commit("Dev", "dev@acme.io", days_ago(40), "Initial import");
        let c1 = remote.commit("Dev", "dev@acme.io", days_ago(20), "Add widget_parser");
        remote.merge(c0, days_ago(15), "Merge branch 'feature'");
        remote.commit("Outsider", "dev@other.com", days_ago(10), "Tweak docs");
        remote.merge(c1, days_ago(5), "Merge branch 'release'");
        remote.commit("Dev", "dev@acme.io", days_ago(2), "Fix parser bug\n\nDetails.");
        remote
    }

    /// Clone URL (a filesystem path)
    pub fn url(&self) -> String {
        self.path().display().to_string()
    }

    /// Working directory
    pub fn path(&self) -> &Path {
        self.repo.workdir().expect("non-bare repository")
    }

    /// Last path component, which is the derived repository name
    pub fn name(&self) -> String {
        self.path()
            .file_name()
            .expect("file name")
            .to_string_lossy()
            .into_owned()
    }

    /// Commit a new file on HEAD
    pub fn commit(&self, author: &str, email: &str, at: DateTime<Utc>, message: &str) -> Oid {
        let n = self.files.get();
        self.files.set(n + 1);

        let file = format!("file_{n}.txt");
        fs::write(self.path().join(&file), format!("{n}\n")).expect("write file");
        let mut index = self.repo.index().expect("index");
        index.add_path(Path::new(&file)).expect("add path");
        index.write().expect("write index");
        let tree = self
            .repo
            .find_tree(index.write_tree().expect("write tree"))
            .expect("find tree");

        let sig = signature(author, email, at);
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("commit")
    }

    /// Merge commit joining HEAD and `other`, authored by acme
    pub fn merge(&self, other: Oid, at: DateTime<Utc>, message: &str) -> Oid {
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .expect("HEAD commit");
        let other = self.repo.find_commit(other).expect("other commit");
        let tree = head.tree().expect("tree");
        let sig = signature("Dev", "dev@acme.io", at);
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&head, &other])
            .expect("merge commit")
    }
}

fn signature(author: &str, email: &str, at: DateTime<Utc>) -> Signature<'static> {
    Signature::new(author, email, &Time::new(at.timestamp(), 0)).expect("signature")
}
