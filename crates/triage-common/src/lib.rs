//! Shared domain types for the issue triage client.
//!
//! Nothing in this crate performs I/O. The client crate owns gateways,
//! the coordinator and the presentation surface; both sides agree on the
//! types defined here.

pub mod credential;
pub mod issue;
pub mod triage;
pub mod wire;

pub use credential::Credential;
pub use issue::{Issue, IssueSet, RepositoryName};
pub use triage::{Category, TriageResult, UnknownCategory};
pub use wire::{CommandIssue, RunCommandRequest, TitlesRequest};
