//! Request payloads sent to the backend.
//!
//! Response payloads are plain JSON sequences/maps and are decoded directly
//! into std collections by the HTTP backend.

use serde::{Deserialize, Serialize};

use crate::issue::{Issue, RepositoryName};

/// Body of `POST /ai/categorize-issues` and `POST /ai/sort-issues`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitlesRequest {
    pub issue_titles: Vec<String>,
}

/// The issue as the command endpoint expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandIssue {
    pub repo_full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub number: i64,
    pub title: String,
    pub body: String,
}

impl CommandIssue {
    pub fn from_issue(repository: &RepositoryName, issue: &Issue) -> Self {
        Self {
            repo_full_name: repository.to_string(),
            id: issue.id,
            number: issue.number,
            title: issue.title.clone(),
            body: issue.body.clone().unwrap_or_default(),
        }
    }
}

/// Body of `POST /run-command`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCommandRequest {
    pub command: String,
    pub issue: CommandIssue,
}
