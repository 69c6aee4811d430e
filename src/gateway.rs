//! Seams to the external collaborators.
//!
//! | Trait               | Collaborator           |
//! |---------------------|------------------------|
//! | `RepositoryGateway` | repository listing     |
//! | `IssueGateway`      | open issues of a repo  |
//! | `TriageService`     | categorize / sort      |
//! | `CommandGateway`    | free-text command runs |
//!
//! [`crate::http::HttpBackend`] implements all four; tests substitute fakes.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use triage_common::{Credential, Issue, RepositoryName};

use crate::errors::GatewayError;

#[async_trait]
pub trait RepositoryGateway: Send + Sync {
    async fn list_repositories(
        &self,
        credential: &Credential,
    ) -> Result<Vec<RepositoryName>, GatewayError>;
}

#[async_trait]
pub trait IssueGateway: Send + Sync {
    async fn list_issues(
        &self,
        credential: &Credential,
        repository: &RepositoryName,
    ) -> Result<Vec<Issue>, GatewayError>;
}

/// Only titles cross this boundary.
#[async_trait]
pub trait TriageService: Send + Sync {
    /// Raw label -> titles. Labels are validated by the caller.
    async fn categorize(
        &self,
        credential: &Credential,
        titles: &[String],
    ) -> Result<BTreeMap<String, Vec<String>>, GatewayError>;

    /// Titles, most important first.
    async fn sort(
        &self,
        credential: &Credential,
        titles: &[String],
    ) -> Result<Vec<String>, GatewayError>;
}

#[async_trait]
pub trait CommandGateway: Send + Sync {
    /// Returns the backend's opaque text result.
    async fn run_command(
        &self,
        credential: &Credential,
        repository: &RepositoryName,
        issue: &Issue,
        command: &str,
    ) -> Result<String, GatewayError>;
}

/// The collaborator handles the coordinator owns.
#[derive(Clone)]
pub struct Gateways {
    pub repositories: Arc<dyn RepositoryGateway>,
    pub issues: Arc<dyn IssueGateway>,
    pub triage: Arc<dyn TriageService>,
    pub commands: Arc<dyn CommandGateway>,
}

impl Gateways {
    /// Uses one backend for every collaborator.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: RepositoryGateway + IssueGateway + TriageService + CommandGateway + 'static,
    {
        Self {
            repositories: backend.clone(),
            issues: backend.clone(),
            triage: backend.clone(),
            commands: backend,
        }
    }
}
