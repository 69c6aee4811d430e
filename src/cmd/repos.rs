//! `triage repos`.

use std::path::Path;

use anyhow::Result;

use issue_triage::ui::render;

use super::context::CliContext;
use crate::Cli;

pub async fn cmd_repos(cli: &Cli, cwd: &Path, filter: Option<&str>) -> Result<()> {
    let ctx = CliContext::load(cli, cwd, None)?;
    let mut coordinator = ctx.coordinator()?;

    coordinator.refresh_repositories()?;
    coordinator.settle().await;
    ctx.report(&coordinator.notices())?;

    let names = coordinator.filter_repositories(filter.unwrap_or(""));
    if names.is_empty() {
        if let Some(query) = filter {
            println!("No repositories match '{}'", query);
        }
        return Ok(());
    }
    print!("{}", render::repositories(&names));
    Ok(())
}
