//! Commit records extracted from repository history

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A commit attributed to the organization
///
/// The timestamp is the author time normalized to UTC, so it serializes as an
/// RFC 3339 instant with a `Z` suffix regardless of the author's local offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// The commit hash (40 hex characters)
    pub hash: String,
    /// Author display name
    pub author_name: String,
    /// Author email address
    pub author_email: String,
    /// Author timestamp
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    /// Commit message, trimmed
    pub message: String,
}

impl CommitRecord {
    /// Get the first line of the commit message (subject)
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Calendar date of the commit in UTC
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    fn sample_commit() -> CommitRecord {
        CommitRecord {
            hash: "1945ab9c752534e733c38ba0109dc3b741f0a6eb".to_string(),
            author_name: "Alice Smith".to_string(),
            author_email: "alice@corpco.com".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 17, 2, 33, 6).unwrap(),
            message: "feat(sync): re-clone on diverged history\n\nDetailed description here."
                .to_string(),
        }
    }

    #[test]
    fn test_commit_json_field_names() {
        let json = serde_json::to_value(sample_commit()).expect("serialize");
        let obj = json.as_object().expect("object");
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["author_email", "author_name", "date", "hash", "message"]
        );
    }

    #[test]
    fn test_date_serializes_as_utc_instant() {
        let json = serde_json::to_value(sample_commit()).expect("serialize");
        assert_eq!(json["date"], "2026-01-17T02:33:06Z");
    }

    #[test]
    fn test_subject_multiline() {
        assert_eq!(
            sample_commit().subject(),
            "feat(sync): re-clone on diverged history"
        );
    }

    #[test]
    fn test_subject_empty_message() {
        let mut commit = sample_commit();
        commit.message = String::new();
        assert_eq!(commit.subject(), "");
    }

    #[test]
    fn test_date_is_utc_calendar_day() {
        let mut commit = sample_commit();
        // 23:30 at -05:00 is already the next day in UTC
        commit.timestamp = chrono::FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 1, 23, 30, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(commit.date(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }
}
