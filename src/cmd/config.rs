//! Configuration view and validation commands: `triage config`.

use std::path::Path;

use anyhow::Result;

use issue_triage::config::{CliOverrides, TriageConfig, TriageToml, default_config_path};

use super::super::{Cli, ConfigCommands};

pub fn cmd_config(cli: &Cli, cwd: &Path, command: Option<ConfigCommands>) -> Result<()> {
    let overrides = CliOverrides {
        base_url: cli.base_url.clone(),
        mode: None,
    };

    match command {
        None | Some(ConfigCommands::Show) => {
            let config = TriageConfig::load(cli.config.as_deref(), cwd, overrides)?;
            let toml = config.file();

            println!();
            println!("Triage Configuration");
            println!("====================");
            println!();
            match &config.source {
                Some(path) => println!("Config file: {}", path.display()),
                None => println!("No triage.toml found; using defaults"),
            }
            println!();

            println!("[backend]");
            println!("  base_url = \"{}\"", toml.backend.base_url);
            println!("  timeout_secs = {}", toml.backend.timeout_secs);
            println!();
            println!("[triage]");
            println!("  mode = \"{}\"", toml.triage.mode);
            println!("  remainder = {}", toml.triage.remainder);
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!("  base_url = \"{}\"", config.base_url());
            println!("  mode = \"{}\"", config.mode());
            println!("  credential_file = \"{}\"", config.credential_file(cwd).display());
            println!(
                "  TRIAGE_TOKEN = {}",
                if config.env_credential().is_some() {
                    "set"
                } else {
                    "unset"
                }
            );
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let config = TriageConfig::load(cli.config.as_deref(), cwd, overrides)?;
            if config.source.is_none() {
                println!("No triage.toml found. Using defaults (valid).");
                return Ok(());
            }

            let warnings = config.file().validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            let config_path = match &cli.config {
                Some(path) => path.clone(),
                None => default_config_path(cwd),
            };
            if config_path.exists() {
                println!("triage.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            TriageToml::default().save(&config_path)?;

            println!("Created triage.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [backend] base_url, timeout_secs");
            println!("  - [triage] mode, remainder");
            println!("  - [session] credential_file");
            println!();
        }
    }

    Ok(())
}
