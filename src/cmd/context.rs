//! Wiring shared by the commands that talk to the backend.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use triage_common::Credential;

use issue_triage::config::{CliOverrides, TriageConfig, TriageMode};
use issue_triage::coordinator::{Notice, TriageCoordinator};
use issue_triage::gateway::Gateways;
use issue_triage::http::HttpBackend;
use issue_triage::session::{FileSessionStore, SessionStore};
use issue_triage::ui::render;

use crate::Cli;

pub struct CliContext {
    pub config: TriageConfig,
    pub store: FileSessionStore,
    pub backend: Arc<HttpBackend>,
}

impl CliContext {
    pub fn load(cli: &Cli, cwd: &Path, mode: Option<TriageMode>) -> Result<Self> {
        let overrides = CliOverrides {
            base_url: cli.base_url.clone(),
            mode,
        };
        let config = TriageConfig::load(cli.config.as_deref(), cwd, overrides)?;
        let store = FileSessionStore::new(config.credential_file(cwd));
        let backend = Arc::new(HttpBackend::new(config.base_url(), config.timeout())?);
        tracing::debug!(
            base_url = config.base_url(),
            mode = %config.mode(),
            session = %store.path().display(),
            "Loaded configuration"
        );
        Ok(Self {
            config,
            store,
            backend,
        })
    }

    /// `TRIAGE_TOKEN` wins over the stored credential.
    pub fn credential(&self) -> Result<Option<Credential>> {
        if let Some(credential) = self.config.env_credential() {
            return Ok(Some(credential.clone()));
        }
        self.store.get()
    }

    /// Builds a coordinator for a signed-in session.
    pub fn coordinator(&self) -> Result<TriageCoordinator> {
        let Some(credential) = self.credential()? else {
            bail!(self.login_prompt());
        };
        Ok(TriageCoordinator::new(
            Gateways::from_backend(self.backend.clone()),
            self.config.mode(),
            self.config.reconcile_options(),
        )
        .with_credential(Some(credential)))
    }

    pub fn login_prompt(&self) -> String {
        format!(
            "{}\nRun `triage login` and open {}",
            render::notice(&Notice::LoginRequired),
            self.backend.login_url()
        )
    }

    /// Prints notices. Fails when nothing usable can be shown.
    pub fn report(&self, notices: &[Notice]) -> Result<()> {
        if notices.contains(&Notice::LoginRequired) {
            bail!(self.login_prompt());
        }
        for notice in notices {
            println!("{}", render::notice(notice));
        }
        match notices.iter().find(|notice| {
            matches!(
                notice,
                Notice::RepositoriesUnavailable(_) | Notice::IssuesUnavailable(_)
            )
        }) {
            Some(blocking) => bail!("{}", blocking),
            None => Ok(()),
        }
    }
}
