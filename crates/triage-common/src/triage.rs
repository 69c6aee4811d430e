use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed, closed set of categories the triage service partitions into.
///
/// Declaration order is significant: it is the display order and the order
/// in which categories claim issues during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Major,
    Minor,
    Bug,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Major, Category::Minor, Category::Bug];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Minor => "Minor",
            Self::Bug => "Bug",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown category '{0}'. Valid values: Major, Minor, Bug")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "bug" => Ok(Self::Bug),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// What the triage service returned, in one of its three forms.
///
/// Only titles cross the service boundary; reconciliation maps them back
/// onto issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageResult {
    /// Category -> titles, in the service's intra-category order.
    Partition(BTreeMap<Category, Vec<String>>),
    /// Titles by priority, most important first.
    Order(Vec<String>),
    /// Unordered set of titles flagged important.
    Subset(HashSet<String>),
}

impl TriageResult {
    /// Builds a partition from the raw label map returned by the categorize
    /// endpoint. Labels outside [`Category`] are returned separately so the
    /// caller can log them; they never become buckets.
    pub fn from_labelled(raw: BTreeMap<String, Vec<String>>) -> (Self, Vec<String>) {
        let mut partition = BTreeMap::new();
        let mut unknown = Vec::new();
        for (label, titles) in raw {
            match label.parse::<Category>() {
                Ok(category) => partition
                    .entry(category)
                    .or_insert_with(Vec::new)
                    .extend(titles),
                Err(_) => unknown.push(label),
            }
        }
        (Self::Partition(partition), unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("major".parse::<Category>().unwrap(), Category::Major);
        assert_eq!("BUG".parse::<Category>().unwrap(), Category::Bug);
        assert_eq!(" Minor ".parse::<Category>().unwrap(), Category::Minor);
    }

    #[test]
    fn test_category_parse_rejects_unknown() {
        let err = "Feature".parse::<Category>().unwrap_err();
        assert_eq!(err, UnknownCategory("Feature".to_string()));
        assert!(err.to_string().contains("Feature"));
    }

    #[test]
    fn test_category_order_follows_declaration() {
        let mut categories = vec![Category::Bug, Category::Major, Category::Minor];
        categories.sort();
        assert_eq!(categories, Category::ALL.to_vec());
    }

    #[test]
    fn test_from_labelled_drops_unknown_labels() {
        let mut raw = BTreeMap::new();
        raw.insert("Major".to_string(), vec!["crash on save".to_string()]);
        raw.insert("Feature".to_string(), vec!["dark mode".to_string()]);
        raw.insert("Bug".to_string(), vec![]);

        let (result, unknown) = TriageResult::from_labelled(raw);

        assert_eq!(unknown, vec!["Feature".to_string()]);
        match result {
            TriageResult::Partition(map) => {
                assert_eq!(map.len(), 2);
                assert_eq!(map[&Category::Major], vec!["crash on save".to_string()]);
                assert!(map[&Category::Bug].is_empty());
            }
            other => panic!("Expected Partition, got {:?}", other),
        }
    }

    #[test]
    fn test_from_labelled_merges_labels_differing_in_case() {
        let mut raw = BTreeMap::new();
        raw.insert("Minor".to_string(), vec!["a".to_string()]);
        raw.insert("minor".to_string(), vec!["b".to_string()]);

        let (result, unknown) = TriageResult::from_labelled(raw);

        assert!(unknown.is_empty());
        let TriageResult::Partition(map) = result else {
            panic!("Expected Partition");
        };
        assert_eq!(map[&Category::Minor], vec!["a".to_string(), "b".to_string()]);
    }
}
