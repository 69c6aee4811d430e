//! The triage coordinator: fetch -> triage -> reconcile -> present.
//!
//! Operations validate their preconditions, update the selection, and spawn
//! the network call as a tokio task. Each task reports back with a
//! `CoordinatorEvent` tagged with the marker it was issued under, and
//! `apply_event` is the only place responses mutate state. Callers drive it
//! through `next_event`, `process_pending_events` or `settle`. A response whose marker is no longer current is discarded.
//!
//! | Marker               | Bumped by                                   |
//! |----------------------|---------------------------------------------|
//! | repository listing   | `refresh_repositories`                      |
//! | pipeline generation  | `select_repository`                         |
//! | command token        | `submit_command`, leaving the issue context |

mod state;


pub use state::{
    ApplyOutcome, CommandOutput, CommandState, Failure, IssueOrigin, Notice, Pipeline,
    RepositoryList, Selection, SettleReport, TriageStatus,
};

use std::collections::{BTreeMap, HashSet};

use tokio::sync::mpsc;
use triage_common::{Category, Credential, Issue, IssueSet, RepositoryName, TriageResult};

use crate::config::TriageMode;
use crate::errors::{CoordinatorError, GatewayError};
use crate::gateway::{Gateways, TriageService};
use crate::reconcile::{ReconcileOptions, TriageView, reconcile};

/// A completed network call, reported by its task.
#[derive(Debug)]
pub(crate) enum CoordinatorEvent {
    RepositoriesLoaded {
        generation: u64,
        result: Result<Vec<RepositoryName>, GatewayError>,
    },
    IssuesLoaded {
        generation: u64,
        repository: RepositoryName,
        result: Result<Vec<Issue>, GatewayError>,
    },
    TriageCompleted {
        generation: u64,
        result: Result<TriageResult, GatewayError>,
    },
    CommandCompleted {
        token: u64,
        issue_number: i64,
        result: Result<String, GatewayError>,
    },
}

pub struct TriageCoordinator {
    gateways: Gateways,
    credential: Option<Credential>,
    mode: TriageMode,
    options: ReconcileOptions,

    events_tx: mpsc::UnboundedSender<CoordinatorEvent>,
    events_rx: mpsc::UnboundedReceiver<CoordinatorEvent>,
    in_flight: usize,

    repositories: RepositoryList,
    repositories_generation: u64,

    selection: Selection,
    pipeline: Pipeline,
    generation: u64,

    command: CommandState,
    command_token: u64,
}

impl TriageCoordinator {
    pub fn new(gateways: Gateways, mode: TriageMode, options: ReconcileOptions) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            gateways,
            credential: None,
            mode,
            options,
            events_tx,
            events_rx,
            in_flight: 0,
            repositories: RepositoryList::default(),
            repositories_generation: 0,
            selection: Selection::default(),
            pipeline: Pipeline::default(),
            generation: 0,
            command: CommandState::default(),
            command_token: 0,
        }
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    /// Replaces the session credential. Clearing it does not drop loaded state.
    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    fn credential(&self) -> Result<Credential, CoordinatorError> {
        self.credential.clone().ok_or(CoordinatorError::AuthMissing)
    }

    // ── operations ───────────────────────────────────────────────────

    /// Fetches the repository list. Any listing already in flight is superseded.
    pub fn refresh_repositories(&mut self) -> Result<(), CoordinatorError> {
        let credential = self.credential()?;
        self.repositories_generation += 1;
        self.repositories = RepositoryList::Loading;

        let generation = self.repositories_generation;
        let gateway = self.gateways.repositories.clone();
        tracing::info!(generation, "Requesting repository list");
        self.spawn(async move {
            let result = gateway.list_repositories(&credential).await;
            CoordinatorEvent::RepositoriesLoaded { generation, result }
        });
        Ok(())
    }

    /// Switches to `repository` and starts its issue fetch.
    ///
    /// Previous issues, triage view, selection and command result are cleared
    /// before the fetch is issued. Responses for earlier selections are
    /// discarded when they arrive.
    pub fn select_repository(
        &mut self,
        repository: impl Into<RepositoryName>,
    ) -> Result<u64, CoordinatorError> {
        let credential = self.credential()?;
        let repository = repository.into();

        self.generation += 1;
        self.selection = Selection::Repository(repository.clone());
        self.pipeline = Pipeline::LoadingIssues;
        self.reset_command();

        let generation = self.generation;
        let gateway = self.gateways.issues.clone();
        tracing::info!(generation, repository = %repository, "Requesting issues");
        self.spawn(async move {
            let result = gateway.list_issues(&credential, &repository).await;
            CoordinatorEvent::IssuesLoaded {
                generation,
                repository,
                result,
            }
        });
        Ok(generation)
    }

    /// Opens one category of a categorized view.
    pub fn select_category(&mut self, category: Category) -> Result<(), CoordinatorError> {
        let repository = self.selected_repository()?;
        if !self.pipeline.view().is_some_and(TriageView::is_categorized) {
            return Err(CoordinatorError::CategoriesUnavailable);
        }
        self.leave_issue();
        self.selection = Selection::Category {
            repository,
            category,
        };
        Ok(())
    }

    /// Opens one issue from the current list or category.
    pub fn select_issue(&mut self, number: i64) -> Result<(), CoordinatorError> {
        let repository = self.selected_repository()?;
        let known = self
            .pipeline
            .issues()
            .is_some_and(|issues| issues.find_by_number(number).is_some());
        if !known {
            return Err(CoordinatorError::UnknownIssue { number });
        }

        let origin = match &self.selection {
            Selection::Category { category, .. } => {
                let in_category = self
                    .pipeline
                    .view()
                    .and_then(|view| view.category(*category))
                    .is_some_and(|issues| issues.iter().any(|i| i.number == number));
                if in_category {
                    IssueOrigin::Category(*category)
                } else {
                    IssueOrigin::List
                }
            }
            Selection::Issue { origin, .. } => *origin,
            _ => IssueOrigin::List,
        };
        if self.selection.issue_number() != Some(number) {
            self.reset_command();
        }
        self.selection = Selection::Issue {
            repository,
            number,
            origin,
        };
        Ok(())
    }

    /// One step up: issue -> where it was opened from, category -> category
    /// list. A no-op at repository level.
    pub fn back(&mut self) {
        let parent = self.selection.parent();
        if parent != self.selection {
            self.leave_issue();
            self.selection = parent;
        }
    }

    /// Sends `text` about the selected issue. Empty text is forwarded as is.
    ///
    /// Returns the submission token. Only the most recently issued submission
    /// can update the result area.
    pub fn submit_command(&mut self, text: impl Into<String>) -> Result<u64, CoordinatorError> {
        let credential = self.credential()?;
        let Selection::Issue {
            repository, number, ..
        } = &self.selection
        else {
            return Err(CoordinatorError::NoIssueSelected);
        };
        let issue = self
            .pipeline
            .issues()
            .and_then(|issues| issues.find_by_number(*number))
            .cloned()
            .ok_or(CoordinatorError::UnknownIssue { number: *number })?;
        let repository = repository.clone();
        let issue_number = issue.number;

        self.command_token += 1;
        self.command = CommandState::Pending { issue_number };

        let token = self.command_token;
        let command = text.into();
        let gateway = self.gateways.commands.clone();
        tracing::info!(token, issue = issue_number, "Submitting command");
        self.spawn(async move {
            let result = gateway
                .run_command(&credential, &repository, &issue, &command)
                .await;
            CoordinatorEvent::CommandCompleted {
                token,
                issue_number,
                result,
            }
        });
        Ok(token)
    }

    fn selected_repository(&self) -> Result<RepositoryName, CoordinatorError> {
        self.selection
            .repository()
            .cloned()
            .ok_or(CoordinatorError::NoRepositorySelected)
    }

    /// Drops the command result when navigation leaves an issue view.
    fn leave_issue(&mut self) {
        if matches!(self.selection, Selection::Issue { .. }) {
            self.reset_command();
        }
    }

    fn reset_command(&mut self) {
        self.command_token += 1;
        self.command = CommandState::Idle;
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = CoordinatorEvent> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let event = task.await;
            let _ = tx.send(event);
        });
    }

    // ── event loop ───────────────────────────────────────────────────

    /// Number of spawned calls whose events have not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Waits for the next completed call and applies it. Returns `None` when
    /// nothing is in flight.
    pub async fn next_event(&mut self) -> Option<ApplyOutcome> {
        if self.in_flight == 0 {
            return None;
        }
        let event = self.events_rx.recv().await?;
        Some(self.apply_event(event))
    }

    /// Applies every event that is already queued, without waiting.
    pub fn process_pending_events(&mut self) -> SettleReport {
        let mut report = SettleReport::default();
        while let Ok(event) = self.events_rx.try_recv() {
            report.record(self.apply_event(event));
        }
        report
    }

    /// Applies events until no call is in flight, including follow-up calls
    /// that applying an event issues.
    pub async fn settle(&mut self) -> SettleReport {
        let mut report = SettleReport::default();
        while let Some(outcome) = self.next_event().await {
            report.record(outcome);
        }
        report
    }

    /// The single mutation point for call results.
    fn apply_event(&mut self, event: CoordinatorEvent) -> ApplyOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        match event {
            CoordinatorEvent::RepositoriesLoaded { generation, result } => {
                self.apply_repositories(generation, result)
            }
            CoordinatorEvent::IssuesLoaded {
                generation,
                repository,
                result,
            } => self.apply_issues(generation, repository, result),
            CoordinatorEvent::TriageCompleted { generation, result } => {
                self.apply_triage(generation, result)
            }
            CoordinatorEvent::CommandCompleted {
                token,
                issue_number,
                result,
            } => self.apply_command(token, issue_number, result),
        }
    }

    fn apply_repositories(
        &mut self,
        generation: u64,
        result: Result<Vec<RepositoryName>, GatewayError>,
    ) -> ApplyOutcome {
        if generation != self.repositories_generation {
            tracing::debug!(generation, "Discarding stale repository list");
            return ApplyOutcome::Discarded;
        }
        self.repositories = match result {
            Ok(names) => {
                tracing::info!(count = names.len(), "Repository list loaded");
                RepositoryList::Loaded(names)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Repository list unavailable");
                RepositoryList::Failed(Failure::from(&err))
            }
        };
        ApplyOutcome::Applied
    }

    fn apply_issues(
        &mut self,
        generation: u64,
        repository: RepositoryName,
        result: Result<Vec<Issue>, GatewayError>,
    ) -> ApplyOutcome {
        if generation != self.generation {
            tracing::debug!(generation, repository = %repository, "Discarding stale issue list");
            return ApplyOutcome::Discarded;
        }

        let issues = match result {
            Ok(issues) => IssueSet::new(repository, issues),
            Err(err) => {
                tracing::warn!(error = %err, repository = %repository, "Issues unavailable");
                self.pipeline = Pipeline::IssuesFailed(Failure::from(&err));
                return ApplyOutcome::Applied;
            }
        };

        if issues.is_empty() {
            tracing::info!(repository = %issues.repository(), "No open issues; skipping triage");
            let view = reconcile(&self.empty_result(), &issues, self.options);
            self.pipeline = Pipeline::Loaded {
                issues,
                view,
                triage: TriageStatus::Applied,
            };
            return ApplyOutcome::Applied;
        }

        let view = TriageView::flat(&issues);
        let titles = issues.titles();
        tracing::info!(
            generation,
            repository = %issues.repository(),
            count = issues.len(),
            mode = %self.mode,
            "Issues loaded; requesting triage"
        );
        self.pipeline = Pipeline::Loaded {
            issues,
            view,
            triage: TriageStatus::Pending,
        };

        match self.credential() {
            Ok(credential) => self.spawn_triage(generation, credential, titles),
            Err(_) => {
                self.pipeline_triage_failed(Failure::from(&GatewayError::AuthMissing));
            }
        }
        ApplyOutcome::Applied
    }

    fn spawn_triage(&mut self, generation: u64, credential: Credential, titles: Vec<String>) {
        let service = self.gateways.triage.clone();
        let mode = self.mode;
        self.spawn(async move {
            let result = run_triage(service.as_ref(), mode, &credential, &titles).await;
            CoordinatorEvent::TriageCompleted { generation, result }
        });
    }

    fn apply_triage(
        &mut self,
        generation: u64,
        result: Result<TriageResult, GatewayError>,
    ) -> ApplyOutcome {
        if generation != self.generation {
            tracing::debug!(generation, "Discarding stale triage result");
            return ApplyOutcome::Discarded;
        }
        let Pipeline::Loaded {
            issues,
            view,
            triage,
        } = &mut self.pipeline
        else {
            return ApplyOutcome::Discarded;
        };

        match result {
            Ok(result) => {
                *view = reconcile(&result, issues, self.options);
                *triage = TriageStatus::Applied;
                tracing::info!(generation, "Triage applied");
            }
            Err(err) => {
                tracing::warn!(error = %err, "Triage unavailable; showing flat list");
                *triage = TriageStatus::Failed(Failure::from(&err));
            }
        }
        ApplyOutcome::Applied
    }

    fn pipeline_triage_failed(&mut self, failure: Failure) {
        if let Pipeline::Loaded { triage, .. } = &mut self.pipeline {
            *triage = TriageStatus::Failed(failure);
        }
    }

    fn apply_command(
        &mut self,
        token: u64,
        issue_number: i64,
        result: Result<String, GatewayError>,
    ) -> ApplyOutcome {
        if token != self.command_token {
            tracing::debug!(token, issue = issue_number, "Discarding superseded command result");
            return ApplyOutcome::Discarded;
        }
        let output = match result {
            Ok(text) => CommandOutput::Succeeded(text),
            Err(err) => {
                tracing::warn!(error = %err, issue = issue_number, "Command failed");
                CommandOutput::Failed(err.to_string())
            }
        };
        self.command = CommandState::Done {
            issue_number,
            output,
        };
        ApplyOutcome::Applied
    }

    fn empty_result(&self) -> TriageResult {
        match self.mode {
            TriageMode::Categorize => TriageResult::Partition(BTreeMap::new()),
            TriageMode::Sort => TriageResult::Order(Vec::new()),
            TriageMode::Important => TriageResult::Subset(HashSet::new()),
        }
    }

    // ── read accessors ───────────────────────────────────────────────

    pub fn mode(&self) -> TriageMode {
        self.mode
    }

    pub fn repositories(&self) -> &RepositoryList {
        &self.repositories
    }

    /// Loaded repositories whose name contains `query`, ignoring case. An
    /// empty query matches everything.
    pub fn filter_repositories(&self, query: &str) -> Vec<&RepositoryName> {
        let RepositoryList::Loaded(names) = &self.repositories else {
            return Vec::new();
        };
        let needle = query.trim().to_lowercase();
        names
            .iter()
            .filter(|name| name.as_str().to_lowercase().contains(&needle))
            .collect()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The current issue set, once fetched.
    pub fn issues(&self) -> Option<&IssueSet> {
        self.pipeline.issues()
    }

    /// The current view: flat while triage is pending or after it failed.
    pub fn view(&self) -> Option<&TriageView> {
        self.pipeline.view()
    }

    /// Issues of the selected category.
    pub fn category_issues(&self) -> Option<&[Issue]> {
        let Selection::Category { category, .. } = &self.selection else {
            return None;
        };
        self.view()?.category(*category)
    }

    pub fn selected_issue(&self) -> Option<&Issue> {
        let number = self.selection.issue_number()?;
        self.issues()?.find_by_number(number)
    }

    pub fn command(&self) -> &CommandState {
        &self.command
    }

    /// The result shown for the selected issue, if it has one.
    pub fn command_output(&self) -> Option<&CommandOutput> {
        match &self.command {
            CommandState::Done {
                issue_number,
                output,
            } if self.selection.issue_number() == Some(*issue_number) => Some(output),
            _ => None,
        }
    }

    /// Conditions to render, derived from current state. Stale responses
    /// never produce one.
    pub fn notices(&self) -> Vec<Notice> {
        let mut notices = Vec::new();
        if self.credential.is_none() {
            notices.push(Notice::LoginRequired);
        }

        match &self.repositories {
            RepositoryList::Failed(failure) if failure.unauthorized => {
                push_login(&mut notices);
            }
            RepositoryList::Failed(failure) => {
                notices.push(Notice::RepositoriesUnavailable(failure.message.clone()));
            }
            RepositoryList::Loaded(names) if names.is_empty() => {
                notices.push(Notice::NoRepositories);
            }
            _ => {}
        }

        match &self.pipeline {
            Pipeline::IssuesFailed(failure) if failure.unauthorized => push_login(&mut notices),
            Pipeline::IssuesFailed(failure) => {
                notices.push(Notice::IssuesUnavailable(failure.message.clone()));
            }
            Pipeline::Loaded { issues, triage, .. } => {
                if issues.is_empty() {
                    notices.push(Notice::NoIssues);
                }
                if let TriageStatus::Failed(failure) = triage {
                    notices.push(Notice::TriageUnavailable(failure.message.clone()));
                }
            }
            Pipeline::Idle | Pipeline::LoadingIssues => {}
        }
        notices
    }
}

fn push_login(notices: &mut Vec<Notice>) {
    if !notices.contains(&Notice::LoginRequired) {
        notices.push(Notice::LoginRequired);
    }
}

/// Calls the triage endpoint for `mode` and shapes the answer.
async fn run_triage(
    service: &dyn TriageService,
    mode: TriageMode,
    credential: &Credential,
    titles: &[String],
) -> Result<TriageResult, GatewayError> {
    match mode {
        TriageMode::Categorize => {
            let raw = service.categorize(credential, titles).await?;
            let (result, unknown) = TriageResult::from_labelled(raw);
            if !unknown.is_empty() {
                tracing::warn!(labels = ?unknown, "Ignoring unknown category labels");
            }
            Ok(result)
        }
        TriageMode::Sort => Ok(TriageResult::Order(service.sort(credential, titles).await?)),
        TriageMode::Important => {
            let flagged = service.sort(credential, titles).await?;
            Ok(TriageResult::Subset(flagged.into_iter().collect()))
        }
    }
}
