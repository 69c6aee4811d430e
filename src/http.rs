//! reqwest-backed implementation of every collaborator seam.
//!
//! | Call               | Method | Path                    |
//! |--------------------|--------|-------------------------|
//! | list repositories  | GET    | `/user/repos`           |
//! | list issues        | GET    | `/issues?repo={name}`   |
//! | categorize         | POST   | `/ai/categorize-issues` |
//! | sort / important   | POST   | `/ai/sort-issues`       |
//! | run command        | POST   | `/run-command`          |
//! | login (browser)    | GET    | `/login/github`         |

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use triage_common::{
    CommandIssue, Credential, Issue, RepositoryName, RunCommandRequest, TitlesRequest,
};

use crate::errors::GatewayError;
use crate::gateway::{CommandGateway, IssueGateway, RepositoryGateway, TriageService};

const USER_REPOS_PATH: &str = "/user/repos";
const ISSUES_PATH: &str = "/issues";
const CATEGORIZE_PATH: &str = "/ai/categorize-issues";
const SORT_PATH: &str = "/ai/sort-issues";
const RUN_COMMAND_PATH: &str = "/run-command";
const LOGIN_PATH: &str = "/login/github";

const USER_AGENT: &str = concat!("issue-triage/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the triage backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        reqwest::Url::parse(base_url)
            .with_context(|| format!("Invalid backend base URL: {}", base_url))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Where the browser login flow starts. The backend eventually redirects
    /// back with a `token` query parameter.
    pub fn login_url(&self) -> String {
        self.url(LOGIN_PATH)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let request = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", credential.secret()))
            .query(query);
        let body = self.send(path, request).await?;
        decode(path, &body)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
        payload: &B,
    ) -> Result<T, GatewayError> {
        let body = self.post(credential, path, payload).await?;
        decode(path, &body)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        credential: &Credential,
        path: &str,
        payload: &B,
    ) -> Result<String, GatewayError> {
        let request = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", credential.secret()))
            .json(payload);
        self.send(path, request).await
    }

    /// Sends the request and returns the body text of a success response.
    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<String, GatewayError> {
        let response = request.send().await.map_err(|source| GatewayError::Request {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| GatewayError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, GatewayError> {
    serde_json::from_str(body).map_err(|e| GatewayError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

/// The command result is opaque text. A JSON string body is unquoted; any
/// other body is returned verbatim.
fn command_output(body: String) -> String {
    match serde_json::from_str::<String>(&body) {
        Ok(text) => text,
        Err(_) => body,
    }
}

#[async_trait]
impl RepositoryGateway for HttpBackend {
    async fn list_repositories(
        &self,
        credential: &Credential,
    ) -> Result<Vec<RepositoryName>, GatewayError> {
        self.get_json(credential, USER_REPOS_PATH, &[]).await
    }
}

#[async_trait]
impl IssueGateway for HttpBackend {
    async fn list_issues(
        &self,
        credential: &Credential,
        repository: &RepositoryName,
    ) -> Result<Vec<Issue>, GatewayError> {
        self.get_json(credential, ISSUES_PATH, &[("repo", repository.as_str())])
            .await
    }
}

#[async_trait]
impl TriageService for HttpBackend {
    async fn categorize(
        &self,
        credential: &Credential,
        titles: &[String],
    ) -> Result<BTreeMap<String, Vec<String>>, GatewayError> {
        let request = TitlesRequest {
            issue_titles: titles.to_vec(),
        };
        self.post_json(credential, CATEGORIZE_PATH, &request).await
    }

    async fn sort(
        &self,
        credential: &Credential,
        titles: &[String],
    ) -> Result<Vec<String>, GatewayError> {
        let request = TitlesRequest {
            issue_titles: titles.to_vec(),
        };
        self.post_json(credential, SORT_PATH, &request).await
    }
}

#[async_trait]
impl CommandGateway for HttpBackend {
    async fn run_command(
        &self,
        credential: &Credential,
        repository: &RepositoryName,
        issue: &Issue,
        command: &str,
    ) -> Result<String, GatewayError> {
        let request = RunCommandRequest {
            command: command.to_string(),
            issue: CommandIssue::from_issue(repository, issue),
        };
        let body = self.post(credential, RUN_COMMAND_PATH, &request).await?;
        Ok(command_output(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_login_url_strips_trailing_slash() {
        assert_eq!(
            backend("http://localhost:8000/").login_url(),
            "http://localhost:8000/login/github"
        );
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let backend = backend("https://example.com/api");
        assert_eq!(backend.url(ISSUES_PATH), "https://example.com/api/issues");
    }

    #[test]
    fn test_new_rejects_relative_url() {
        assert!(HttpBackend::new("localhost", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_decode_error_names_endpoint() {
        let err = decode::<Vec<String>>(USER_REPOS_PATH, "{\"oops\": 1}").unwrap_err();
        match err {
            GatewayError::Decode { endpoint, .. } => assert_eq!(endpoint, USER_REPOS_PATH),
            other => panic!("Expected Decode, got {:?}", other),
        }
    }

    #[test]
    fn test_command_output_unquotes_json_string() {
        assert_eq!(command_output("\"done\"".to_string()), "done");
        assert_eq!(command_output("plain text".to_string()), "plain text");
        assert_eq!(
            command_output("{\"status\":\"ok\"}".to_string()),
            "{\"status\":\"ok\"}"
        );
    }
}
