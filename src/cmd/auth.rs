//! Session commands: `triage login`, `triage auth`, `triage logout`.

use std::path::Path;

use anyhow::{Context, Result, bail};
use reqwest::Url;
use triage_common::Credential;

use issue_triage::session::{SessionStore, bootstrap_credential};
use issue_triage::ui::icons::CHECK;

use super::context::CliContext;
use crate::Cli;

pub fn cmd_login(cli: &Cli, cwd: &Path, open: bool) -> Result<()> {
    let ctx = CliContext::load(cli, cwd, None)?;
    let url = ctx.backend.login_url();

    println!("Sign in at: {}", url);
    println!("Then run `triage auth <redirect-url>` with the URL you were sent back to.");

    if open && let Err(e) = open::that(&url) {
        eprintln!("Failed to open browser: {}", e);
    }
    Ok(())
}

pub fn cmd_auth(cli: &Cli, cwd: &Path, location: &str) -> Result<()> {
    let ctx = CliContext::load(cli, cwd, None)?;
    let location = location.trim();

    match Url::parse(location) {
        Ok(url) if url.has_host() => {
            let boot = bootstrap_credential(&url, &ctx.store)?;
            if !boot.handed_off {
                bail!("No token found in {}", boot.location);
            }
            println!("{}Logged in", CHECK);
            println!("Continue at: {}", boot.location);
        }
        _ => {
            let credential = Credential::new(location).context("Token must not be empty")?;
            ctx.store.set(credential)?;
            println!("{}Logged in", CHECK);
        }
    }
    println!("Credential stored in {}", ctx.store.path().display());
    Ok(())
}

pub fn cmd_logout(cli: &Cli, cwd: &Path) -> Result<()> {
    let ctx = CliContext::load(cli, cwd, None)?;
    ctx.store.clear()?;
    println!("Logged out");
    if ctx.config.env_credential().is_some() {
        println!("Note: TRIAGE_TOKEN is still set in the environment.");
    }
    Ok(())
}
