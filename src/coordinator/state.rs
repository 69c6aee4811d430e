//! View state owned by the coordinator.
//!
//! Every type here is a sum type over mutually exclusive states, so
//! combinations such as "a category and an issue both selected" cannot be
//! represented.

use triage_common::{Category, IssueSet, RepositoryName};

use crate::errors::GatewayError;
use crate::reconcile::TriageView;

/// Where an issue view was opened from; `back` returns there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOrigin {
    /// The repository's flat or prioritized issue list.
    List,
    Category(Category),
}

/// What the user is looking at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    NoRepository,
    /// The repository's issue list or category list.
    Repository(RepositoryName),
    Category {
        repository: RepositoryName,
        category: Category,
    },
    Issue {
        repository: RepositoryName,
        number: i64,
        origin: IssueOrigin,
    },
}

impl Selection {
    pub fn repository(&self) -> Option<&RepositoryName> {
        match self {
            Selection::NoRepository => None,
            Selection::Repository(repository)
            | Selection::Category { repository, .. }
            | Selection::Issue { repository, .. } => Some(repository),
        }
    }

    pub fn issue_number(&self) -> Option<i64> {
        match self {
            Selection::Issue { number, .. } => Some(*number),
            _ => None,
        }
    }

    /// The view one step up. Repository level and above stay put.
    pub fn parent(&self) -> Selection {
        match self {
            Selection::Issue {
                repository,
                origin: IssueOrigin::Category(category),
                ..
            } => Selection::Category {
                repository: repository.clone(),
                category: *category,
            },
            Selection::Issue {
                repository,
                origin: IssueOrigin::List,
                ..
            }
            | Selection::Category { repository, .. } => Selection::Repository(repository.clone()),
            other => other.clone(),
        }
    }
}

/// A gateway failure reduced to what the view needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub message: String,
    /// The backend rejected or never saw a credential.
    pub unauthorized: bool,
}

impl From<&GatewayError> for Failure {
    fn from(err: &GatewayError) -> Self {
        Self {
            message: err.to_string(),
            unauthorized: err.is_unauthorized(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RepositoryList {
    #[default]
    NotLoaded,
    Loading,
    Loaded(Vec<RepositoryName>),
    Failed(Failure),
}

/// Progress of the triage enrichment for a loaded issue set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageStatus {
    Pending,
    Applied,
    /// The issue set stays visible as a flat list.
    Failed(Failure),
}

/// Fetch and triage progress for the selected repository.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Pipeline {
    #[default]
    Idle,
    LoadingIssues,
    IssuesFailed(Failure),
    Loaded {
        issues: IssueSet,
        view: TriageView,
        triage: TriageStatus,
    },
}

impl Pipeline {
    pub fn issues(&self) -> Option<&IssueSet> {
        match self {
            Pipeline::Loaded { issues, .. } => Some(issues),
            _ => None,
        }
    }

    pub fn view(&self) -> Option<&TriageView> {
        match self {
            Pipeline::Loaded { view, .. } => Some(view),
            _ => None,
        }
    }

    /// Issues loaded but triage failed; the view is the flat fallback.
    pub fn triage_failed(&self) -> bool {
        matches!(
            self,
            Pipeline::Loaded {
                triage: TriageStatus::Failed(_),
                ..
            }
        )
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            Pipeline::LoadingIssues
                | Pipeline::Loaded {
                    triage: TriageStatus::Pending,
                    ..
                }
        )
    }
}

/// Outcome shown in the command result area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    Succeeded(String),
    /// Failure text shown in place of output.
    Failed(String),
}

impl CommandOutput {
    pub fn text(&self) -> &str {
        match self {
            CommandOutput::Succeeded(text) | CommandOutput::Failed(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CommandState {
    #[default]
    Idle,
    Pending {
        issue_number: i64,
    },
    Done {
        issue_number: i64,
        output: CommandOutput,
    },
}

/// User-facing conditions the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// No usable credential. Rendered as a login prompt, not an error.
    LoginRequired,
    RepositoriesUnavailable(String),
    IssuesUnavailable(String),
    /// Issues are shown unsorted because triage failed.
    TriageUnavailable(String),
    NoRepositories,
    NoIssues,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::LoginRequired => write!(f, "Log in to see your repositories"),
            Notice::RepositoriesUnavailable(reason) => {
                write!(f, "Repositories could not be loaded: {}", reason)
            }
            Notice::IssuesUnavailable(reason) => {
                write!(f, "Issues could not be loaded: {}", reason)
            }
            Notice::TriageUnavailable(reason) => {
                write!(f, "Showing issues unsorted; triage failed: {}", reason)
            }
            Notice::NoRepositories => write!(f, "No repositories found"),
            Notice::NoIssues => write!(f, "No open issues"),
        }
    }
}

/// Whether an event changed visible state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The response belonged to a superseded request.
    Discarded,
}

/// Counts from draining in-flight work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleReport {
    pub applied: usize,
    pub discarded: usize,
}

impl SettleReport {
    pub(crate) fn record(&mut self, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Applied => self.applied += 1,
            ApplyOutcome::Discarded => self.discarded += 1,
        }
    }
}
