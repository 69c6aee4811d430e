use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "triage")]
#[command(version, about = "Browse repositories, triage their issues, run issue commands")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to triage.toml. Defaults to ./triage.toml, then the user config dir.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL. Overrides triage.toml and TRIAGE_BASE_URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the backend login URL
    Login {
        /// Open the URL in the default browser
        #[arg(long)]
        open: bool,
    },
    /// Store the credential from a login redirect URL or a raw token
    Auth {
        /// The URL the login flow redirected to, or the token itself
        location: String,
    },
    /// Forget the stored credential
    Logout,
    /// List repositories accessible to the signed-in user
    Repos {
        /// Only show repositories whose name contains this text (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Fetch and triage the open issues of a repository
    Issues {
        repo: String,
        /// Triage mode: categorize, sort, important
        #[arg(short, long)]
        mode: Option<String>,
        /// Only show one category (categorize mode): Major, Minor, Bug
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Run a free-text command against one issue
    Command {
        repo: String,
        /// Issue number
        number: i64,
        /// Command text; may be empty
        #[arg(num_args = 0.., trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// View, validate or create configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default triage.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    issue_triage::telemetry::init_tracing(
        cli.log_json,
        issue_triage::telemetry::level_for(cli.verbose),
    );
    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    match &cli.command {
        Commands::Login { open } => cmd::cmd_login(&cli, &cwd, *open)?,
        Commands::Auth { location } => cmd::cmd_auth(&cli, &cwd, location)?,
        Commands::Logout => cmd::cmd_logout(&cli, &cwd)?,
        Commands::Repos { filter } => cmd::cmd_repos(&cli, &cwd, filter.as_deref()).await?,
        Commands::Issues {
            repo,
            mode,
            category,
        } => cmd::cmd_issues(&cli, &cwd, repo, mode.as_deref(), category.as_deref()).await?,
        Commands::Command { repo, number, text } => {
            cmd::cmd_command(&cli, &cwd, repo, *number, &text.join(" ")).await?
        }
        Commands::Config { command } => cmd::cmd_config(&cli, &cwd, command.clone())?,
    }

    Ok(())
}
