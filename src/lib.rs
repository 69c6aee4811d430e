//! Client-side issue triage.
//!
//! Fetches a repository's open issues, asks the triage service to categorize
//! or prioritize their titles, and reconciles the answer back onto the issue
//! records. [`coordinator::TriageCoordinator`] keeps that pipeline consistent
//! while the user switches repositories and submits issue commands.

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod gateway;
pub mod http;
pub mod reconcile;
pub mod session;
pub mod telemetry;
pub mod ui;
