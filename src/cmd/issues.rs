//! `triage issues` and `triage command`.

use std::path::Path;

use anyhow::{Context, Result, bail};
use triage_common::Category;

use issue_triage::config::TriageMode;
use issue_triage::coordinator::{CommandOutput, TriageCoordinator};
use issue_triage::errors::CoordinatorError;
use issue_triage::ui::icons::HOURGLASS;
use issue_triage::ui::render;

use super::context::CliContext;
use crate::Cli;

/// Selects `repo` and waits for fetch and triage to finish.
async fn load_repository(ctx: &CliContext, repo: &str) -> Result<TriageCoordinator> {
    let mut coordinator = ctx.coordinator()?;
    coordinator.select_repository(repo)?;
    println!("{}Loading issues for {}", HOURGLASS, repo);
    coordinator.settle().await;
    ctx.report(&coordinator.notices())?;
    Ok(coordinator)
}

pub async fn cmd_issues(
    cli: &Cli,
    cwd: &Path,
    repo: &str,
    mode: Option<&str>,
    category: Option<&str>,
) -> Result<()> {
    let mode = mode.map(str::parse::<TriageMode>).transpose()?;
    let category = category
        .map(str::parse::<Category>)
        .transpose()
        .context("Invalid --category")?;
    let ctx = CliContext::load(cli, cwd, mode)?;
    let mut coordinator = load_repository(&ctx, repo).await?;

    let mut only = category;
    if let Some(category) = category {
        match coordinator.select_category(category) {
            Ok(()) => {}
            // The notice already explains why; show the flat fallback.
            Err(CoordinatorError::CategoriesUnavailable)
                if coordinator.pipeline().triage_failed() =>
            {
                only = None;
            }
            Err(err) => return Err(err.into()),
        }
    }
    if let Some(view) = coordinator.view() {
        print!("{}", render::view(view, only));
    }
    Ok(())
}

pub async fn cmd_command(
    cli: &Cli,
    cwd: &Path,
    repo: &str,
    number: i64,
    text: &str,
) -> Result<()> {
    let ctx = CliContext::load(cli, cwd, None)?;
    let mut coordinator = load_repository(&ctx, repo).await?;

    coordinator.select_issue(number)?;
    if let Some(issue) = coordinator.selected_issue() {
        print!("{}", render::issue_detail(&repo.into(), issue));
    }
    coordinator.submit_command(text)?;
    coordinator.settle().await;

    match coordinator.command_output() {
        Some(output @ CommandOutput::Succeeded(_)) => {
            println!("{}", render::command_output(output));
            Ok(())
        }
        Some(output @ CommandOutput::Failed(_)) => {
            println!("{}", render::command_output(output));
            bail!("Command did not complete")
        }
        None => bail!("No result received for issue #{}", number),
    }
}
