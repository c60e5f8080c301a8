// Copyright (c) 2026 - present orgpulse contributors
// SPDX-License-Identifier: MIT

//! orgpulse-git: repository synchronization and commit extraction for orgpulse
//!
//! This library crate keeps local working copies of remote repositories up to
//! date and extracts the commits attributed to an organization within a
//! lookback window.

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use orgpulse_git::{ExtractOptions, RepoSync, lookback_start};
//!
//! let sync = RepoSync::git2();
//! let repo = sync
//!     .sync("https://github.com/rust-lang/log.git", "deploy/log")
//!     .expect("sync repo");
//!
//! let options = ExtractOptions::new(lookback_start(Utc::now(), 3), "example.com");
//! for c in repo.extract_with(&options).expect("extract commits") {
//!     println!("{} {} - {}", c.date(), c.author_name, c.subject());
//! }
//! ```

pub mod commit;
pub mod error;
pub mod repo;
pub mod spec;
pub mod sync;

pub use commit::CommitRecord;
pub use error::{ExtractError, GitError, SyncError};
pub use repo::{ExtractOptions, GitRepo, lookback_start, matches_organization};
pub use spec::RepositorySpec;
pub use sync::{Git2Backend, RepoSync, SyncOutcome, VcsBackend};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commit::CommitRecord;
    pub use crate::error::{ExtractError, SyncError};
    pub use crate::repo::{ExtractOptions, GitRepo, lookback_start};
    pub use crate::spec::RepositorySpec;
    pub use crate::sync::{RepoSync, SyncOutcome};
}
