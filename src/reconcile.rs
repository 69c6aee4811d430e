//! Maps a titles-only [`TriageResult`] back onto the issues it was computed
//! from.
//!
//! Matching is exact string equality on `title`. Issues sharing a title all
//! match that title, in fetch order. Titles with no matching issue are
//! dropped. Every issue lands in at most one place in the output.

use std::collections::{BTreeMap, HashMap, HashSet};

use triage_common::{Category, Issue, IssueSet, TriageResult};

/// Reconciliation knobs chosen by the calling variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Collect issues no category claimed into an explicit remainder bucket.
    pub remainder: bool,
}

/// A displayable view over one issue set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageView {
    /// Fetch order, no triage applied.
    Flat(Vec<Issue>),
    /// One group per [`Category`], in declaration order.
    Categorized {
        groups: BTreeMap<Category, Vec<Issue>>,
        /// `Some` only when the remainder bucket is enabled.
        remainder: Option<Vec<Issue>>,
    },
    /// Total priority order, matched issues first.
    Prioritized(Vec<Issue>),
    /// Flagged issues and everything else, both in fetch order.
    Important {
        important: Vec<Issue>,
        remaining: Vec<Issue>,
    },
}

impl TriageView {
    pub fn flat(issues: &IssueSet) -> Self {
        TriageView::Flat(issues.issues().to_vec())
    }

    /// Every issue in the view, in display order.
    pub fn issues(&self) -> Vec<&Issue> {
        match self {
            TriageView::Flat(issues) | TriageView::Prioritized(issues) => issues.iter().collect(),
            TriageView::Categorized { groups, remainder } => groups
                .values()
                .flatten()
                .chain(remainder.iter().flatten())
                .collect(),
            TriageView::Important {
                important,
                remaining,
            } => important.iter().chain(remaining).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.issues().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Issues of one category. `None` when the view is not categorized.
    pub fn category(&self, category: Category) -> Option<&[Issue]> {
        match self {
            TriageView::Categorized { groups, .. } => {
                Some(groups.get(&category).map(Vec::as_slice).unwrap_or(&[]))
            }
            _ => None,
        }
    }

    pub fn is_categorized(&self) -> bool {
        matches!(self, TriageView::Categorized { .. })
    }
}

/// Reconciles `result` against the issue set it was computed from.
pub fn reconcile(
    result: &TriageResult,
    issues: &IssueSet,
    options: ReconcileOptions,
) -> TriageView {
    match result {
        TriageResult::Partition(partition) => reconcile_partition(partition, issues, options),
        TriageResult::Order(order) => reconcile_order(order, issues),
        TriageResult::Subset(subset) => reconcile_subset(subset, issues),
    }
}

/// Partition form. Categories claim issues in declaration order; an issue
/// already claimed by an earlier category is not placed again.
pub fn reconcile_partition(
    partition: &BTreeMap<Category, Vec<String>>,
    issues: &IssueSet,
    options: ReconcileOptions,
) -> TriageView {
    let mut matcher = TitleMatcher::new(issues);
    let groups = Category::ALL
        .iter()
        .map(|category| {
            let titles = partition.get(category).map(Vec::as_slice).unwrap_or(&[]);
            (*category, matcher.claim_all(titles))
        })
        .collect();
    let remainder = options.remainder.then(|| matcher.unclaimed());

    TriageView::Categorized { groups, remainder }
}

/// Order form. A stable partition: matched issues in result order, then
/// unmatched issues in fetch order.
pub fn reconcile_order(order: &[String], issues: &IssueSet) -> TriageView {
    let mut matcher = TitleMatcher::new(issues);
    let mut ordered = matcher.claim_all(order);
    ordered.extend(matcher.unclaimed());
    TriageView::Prioritized(ordered)
}

/// Subset form. Both groups keep fetch order.
pub fn reconcile_subset(subset: &HashSet<String>, issues: &IssueSet) -> TriageView {
    let (important, remaining): (Vec<Issue>, Vec<Issue>) = issues
        .issues()
        .iter()
        .cloned()
        .partition(|issue| subset.contains(&issue.title));
    TriageView::Important {
        important,
        remaining,
    }
}

/// Tracks which issues have been placed while titles are claimed.
struct TitleMatcher<'a> {
    issues: &'a [Issue],
    by_title: HashMap<&'a str, Vec<usize>>,
    claimed: Vec<bool>,
}

impl<'a> TitleMatcher<'a> {
    fn new(set: &'a IssueSet) -> Self {
        let issues = set.issues();
        let mut by_title: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, issue) in issues.iter().enumerate() {
            by_title.entry(issue.title.as_str()).or_default().push(idx);
        }
        Self {
            issues,
            by_title,
            claimed: vec![false; issues.len()],
        }
    }

    /// Claims every unclaimed issue matching each title, in title order.
    /// A repeated title contributes nothing the second time.
    fn claim_all(&mut self, titles: &[String]) -> Vec<Issue> {
        let mut placed = Vec::new();
        for title in titles {
            let Some(indices) = self.by_title.get(title.as_str()) else {
                continue;
            };
            for &idx in indices {
                if !self.claimed[idx] {
                    self.claimed[idx] = true;
                    placed.push(self.issues[idx].clone());
                }
            }
        }
        placed
    }

    fn unclaimed(&self) -> Vec<Issue> {
        self.issues
            .iter()
            .zip(&self.claimed)
            .filter(|(_, claimed)| !**claimed)
            .map(|(issue, _)| issue.clone())
            .collect()
    }
}
