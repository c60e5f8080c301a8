// Copyright (c) 2026 - present orgpulse contributors
// SPDX-License-Identifier: MIT

//! Repository identity derived from a remote URL

use serde::{Deserialize, Serialize};

/// A remote repository and the short name used to label it
///
/// The name is derived once from the URL and keys the working-copy directory
/// and the report section for this repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositorySpec {
    /// Short repository name
    #[serde(rename = "repo_name")]
    pub name: String,
    /// Remote URL as given by the user
    #[serde(rename = "repo_url")]
    pub url: String,
}

impl RepositorySpec {
    /// Build a spec from a remote URL
    ///
    /// ```
    /// use orgpulse_git::RepositorySpec;
    ///
    /// let spec = RepositorySpec::from_url("https://github.com/acme/widgets.git");
    /// assert_eq!(spec.name, "widgets");
    /// ```
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let name = derive_name(&url);
        Self { name, url }
    }
}

/// Fallback when neither the last segment nor the flattened URL is usable
const FALLBACK_NAME: &str = "repository";

/// Last path segment of `url` without a trailing `.git`
///
/// The result is always a single path component: never empty, never `.` or
/// `..`, and free of path separators.
fn derive_name(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches(['/', '\\']);
    let segment = trimmed.rsplit(['/', ':', '\\']).next().unwrap_or(trimmed);
    let name = segment.strip_suffix(".git").unwrap_or(segment);
    if is_plain_component(name) {
        return name.to_string();
    }

    // Nothing usable in the last segment, fall back to a flattened URL
    let flattened = trimmed.replace(['/', ':', '\\', '\0'], "_");
    if is_plain_component(&flattened) {
        flattened
    } else {
        FALLBACK_NAME.to_string()
    }
}

/// Whether `name` joins onto a directory as exactly one new child
fn is_plain_component(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().all(|c| c == '.')
        && !name.contains(['/', '\\', '\0'])
}
