use serde::{Deserialize, Serialize};

/// Name identifying a repository in the repository gateway's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepositoryName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for RepositoryName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// An open issue as returned by the issue gateway.
///
/// `title` is the only key the triage service ever sees; `id` and `number`
/// never cross that boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Gateway-side identifier. Some backends only send `number`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub number: i64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

/// The issues fetched for one repository snapshot.
///
/// A new fetch replaces the whole set; there is no incremental update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSet {
    repository: RepositoryName,
    issues: Vec<Issue>,
}

impl IssueSet {
    pub fn new(repository: RepositoryName, issues: Vec<Issue>) -> Self {
        Self { repository, issues }
    }

    pub fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Title multiset in fetch order, duplicates included.
    pub fn titles(&self) -> Vec<String> {
        self.issues.iter().map(|issue| issue.title.clone()).collect()
    }

    pub fn find_by_number(&self, number: i64) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.number == number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(number: i64, title: &str) -> Issue {
        Issue {
            id: None,
            number,
            title: title.to_string(),
            body: None,
        }
    }

    #[test]
    fn test_titles_keep_duplicates_and_order() {
        let set = IssueSet::new(
            "repo".into(),
            vec![issue(1, "a"), issue(2, "b"), issue(3, "a")],
        );
        assert_eq!(set.titles(), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_find_by_number() {
        let set = IssueSet::new("repo".into(), vec![issue(7, "x"), issue(9, "y")]);
        assert_eq!(set.find_by_number(9).map(|i| i.title.as_str()), Some("y"));
        assert!(set.find_by_number(1).is_none());
    }

    #[test]
    fn test_issue_deserializes_without_id_and_with_null_body() {
        let json = r#"{"number": 42, "title": "Bug", "body": null, "state": "open"}"#;
        let parsed: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id, None);
        assert_eq!(parsed.number, 42);
        assert!(parsed.body.is_none());
    }

    #[test]
    fn test_repository_name_serializes_as_string() {
        let name = RepositoryName::from("octo/widgets");
        assert_eq!(serde_json::to_string(&name).unwrap(), r#""octo/widgets""#);
        assert_eq!(name.to_string(), "octo/widgets");
    }
}
