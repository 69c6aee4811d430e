//! Layered configuration for the triage client.
//!
//! Values come from `triage.toml`, then environment variables, then CLI
//! flags, each layer overriding the previous one.
//!
//! # Configuration File Format
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:8000"
//! timeout_secs = 30
//!
//! [triage]
//! mode = "categorize"   # categorize | sort | important
//! remainder = true
//!
//! [session]
//! credential_file = "/home/me/.config/issue-triage/credential.json"
//! ```
//!
//! # Environment
//!
//! | Variable          | Overrides              |
//! |-------------------|------------------------|
//! | `TRIAGE_BASE_URL` | `backend.base_url`     |
//! | `TRIAGE_MODE`     | `triage.mode`          |
//! | `TRIAGE_TOKEN`    | the persisted credential |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use triage_common::Credential;

use crate::reconcile::ReconcileOptions;

pub const CONFIG_FILE_NAME: &str = "triage.toml";
pub const APP_DIR_NAME: &str = "issue-triage";
const CREDENTIAL_FILE_NAME: &str = "credential.json";

pub const ENV_BASE_URL: &str = "TRIAGE_BASE_URL";
pub const ENV_MODE: &str = "TRIAGE_MODE";
pub const ENV_TOKEN: &str = "TRIAGE_TOKEN";

/// Which triage variant the client runs after issues load.
///
/// | Mode         | Endpoint                   | Result form |
/// |--------------|----------------------------|-------------|
/// | `Categorize` | `/ai/categorize-issues`    | Partition   |
/// | `Sort`       | `/ai/sort-issues`          | Order       |
/// | `Important`  | `/ai/sort-issues`          | Subset      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageMode {
    #[default]
    Categorize,
    Sort,
    Important,
}

impl std::fmt::Display for TriageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriageMode::Categorize => write!(f, "categorize"),
            TriageMode::Sort => write!(f, "sort"),
            TriageMode::Important => write!(f, "important"),
        }
    }
}

impl std::str::FromStr for TriageMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "categorize" => Ok(TriageMode::Categorize),
            "sort" => Ok(TriageMode::Sort),
            "important" => Ok(TriageMode::Important),
            _ => anyhow::bail!(
                "Invalid triage mode '{}'. Valid values: categorize, sort, important",
                s
            ),
        }
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Triage variant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageSection {
    #[serde(default)]
    pub mode: TriageMode,
    /// Collect issues no category claimed into an "uncategorized" bucket
    #[serde(default = "default_remainder")]
    pub remainder: bool,
}

fn default_remainder() -> bool {
    true
}

impl Default for TriageSection {
    fn default() -> Self {
        Self {
            mode: TriageMode::default(),
            remainder: default_remainder(),
        }
    }
}

/// Session store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSection {
    /// Where the credential is persisted (default: user config dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_file: Option<PathBuf>,
}

/// Contents of `triage.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageToml {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub triage: TriageSection,
    #[serde(default)]
    pub session: SessionSection,
}

impl TriageToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse triage.toml")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize triage.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Returns human-readable warnings; an empty list means the file is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if reqwest::Url::parse(&self.backend.base_url).is_err() {
            warnings.push(format!(
                "Invalid backend.base_url '{}': should be an absolute URL",
                self.backend.base_url
            ));
        }
        if self.backend.timeout_secs == 0 {
            warnings.push("backend.timeout_secs must be greater than 0".to_string());
        }

        warnings
    }
}

/// Returns the directory holding per-user files (config, credential).
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
}

/// Finds the config file to load: explicit path, then `./triage.toml`, then
/// the user config dir. Returns `None` when no file exists.
pub fn resolve_config_path(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = cwd.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    user_config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}

/// Path `config init` writes to when no `--config` is given.
pub fn default_config_path(cwd: &Path) -> PathBuf {
    user_config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| cwd.join(CONFIG_FILE_NAME))
}

/// CLI-level overrides, the last configuration layer.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub mode: Option<TriageMode>,
}

/// Effective configuration after applying file, environment and CLI layers.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// The file the base layer came from, if any
    pub source: Option<PathBuf>,
    toml: TriageToml,
    base_url: String,
    mode: TriageMode,
    env_token: Option<Credential>,
}

impl TriageConfig {
    /// Loads the file layer (if any) and applies environment and CLI overrides.
    pub fn load(explicit: Option<&Path>, cwd: &Path, cli: CliOverrides) -> Result<Self> {
        let source = resolve_config_path(explicit, cwd);
        let toml = match &source {
            Some(path) => TriageToml::load(path)?,
            None => TriageToml::default(),
        };
        Self::from_layers(source, toml, EnvLayer::from_process()?, cli)
    }

    fn from_layers(
        source: Option<PathBuf>,
        toml: TriageToml,
        env: EnvLayer,
        cli: CliOverrides,
    ) -> Result<Self> {
        let base_url = cli
            .base_url
            .or(env.base_url)
            .unwrap_or_else(|| toml.backend.base_url.clone());
        reqwest::Url::parse(&base_url)
            .with_context(|| format!("Invalid backend base URL: {}", base_url))?;

        let mode = cli.mode.or(env.mode).unwrap_or(toml.triage.mode);

        Ok(Self {
            source,
            toml,
            base_url,
            mode,
            env_token: env.token.and_then(Credential::new),
        })
    }

    pub fn file(&self) -> &TriageToml {
        &self.toml
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.toml.backend.timeout_secs.max(1))
    }

    pub fn mode(&self) -> TriageMode {
        self.mode
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            remainder: self.toml.triage.remainder,
        }
    }

    /// Credential handed over through `TRIAGE_TOKEN`, if set.
    pub fn env_credential(&self) -> Option<&Credential> {
        self.env_token.as_ref()
    }

    /// Where the session store keeps the credential.
    pub fn credential_file(&self, cwd: &Path) -> PathBuf {
        if let Some(path) = &self.toml.session.credential_file {
            return path.clone();
        }
        user_config_dir()
            .unwrap_or_else(|| cwd.join(".triage"))
            .join(CREDENTIAL_FILE_NAME)
    }
}

/// Environment variable layer, read once.
#[derive(Debug, Clone, Default)]
struct EnvLayer {
    base_url: Option<String>,
    mode: Option<TriageMode>,
    token: Option<String>,
}

impl EnvLayer {
    fn from_process() -> Result<Self> {
        let mode = match std::env::var(ENV_MODE) {
            Ok(value) if !value.trim().is_empty() => Some(
                value
                    .parse()
                    .with_context(|| format!("Invalid {} value", ENV_MODE))?,
            ),
            _ => None,
        };
        Ok(Self {
            base_url: std::env::var(ENV_BASE_URL)
                .ok()
                .filter(|value| !value.trim().is_empty()),
            mode,
            token: std::env::var(ENV_TOKEN).ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let toml = TriageToml::default();
        assert_eq!(toml.backend.base_url, "http://localhost:8000");
        assert_eq!(toml.backend.timeout_secs, 30);
        assert_eq!(toml.triage.mode, TriageMode::Categorize);
        assert!(toml.triage.remainder);
        assert!(toml.session.credential_file.is_none());
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_parse_full_file() {
        let content = r#"
[backend]
base_url = "https://triage.example.com"
timeout_secs = 5

[triage]
mode = "important"
remainder = true

[session]
credential_file = "/tmp/cred.json"
"#;
        let toml = TriageToml::parse(content).unwrap();
        assert_eq!(toml.backend.base_url, "https://triage.example.com");
        assert_eq!(toml.backend.timeout_secs, 5);
        assert_eq!(toml.triage.mode, TriageMode::Important);
        assert_eq!(
            toml.session.credential_file,
            Some(PathBuf::from("/tmp/cred.json"))
        );
    }

    #[test]
    fn test_parse_partial_file_fills_defaults() {
        let toml = TriageToml::parse("[triage]\nmode = \"sort\"\n").unwrap();
        assert_eq!(toml.triage.mode, TriageMode::Sort);
        assert!(toml.triage.remainder);
        assert_eq!(toml.backend.timeout_secs, 30);
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        assert!(TriageToml::parse("[triage]\nmode = \"shuffle\"\n").is_err());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("SORT".parse::<TriageMode>().unwrap(), TriageMode::Sort);
        assert_eq!(
            "important".parse::<TriageMode>().unwrap(),
            TriageMode::Important
        );
        let err = "nope".parse::<TriageMode>().unwrap_err();
        assert!(err.to_string().contains("categorize, sort, important"));
    }

    #[test]
    fn test_validate_reports_bad_values() {
        let mut toml = TriageToml::default();
        toml.backend.base_url = "not a url".to_string();
        toml.backend.timeout_secs = 0;
        let warnings = toml.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("base_url"));
        assert!(warnings[1].contains("timeout_secs"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut toml = TriageToml::default();
        toml.triage.mode = TriageMode::Sort;

        toml.save(&path).unwrap();
        let loaded = TriageToml::load(&path).unwrap();

        assert_eq!(loaded.triage.mode, TriageMode::Sort);
    }

    #[test]
    fn test_resolve_prefers_explicit_then_local_file() {
        let dir = tempdir().unwrap();
        let explicit = dir.path().join("custom.toml");
        assert_eq!(
            resolve_config_path(Some(&explicit), dir.path()),
            Some(explicit.clone())
        );

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "").unwrap();
        assert_eq!(
            resolve_config_path(None, dir.path()),
            Some(dir.path().join(CONFIG_FILE_NAME))
        );
    }

    // ── layering ─────────────────────────────────────────────────────

    #[test]
    fn test_env_overrides_file_and_cli_overrides_env() {
        let mut toml = TriageToml::default();
        toml.backend.base_url = "http://file:1".to_string();
        toml.triage.mode = TriageMode::Categorize;
        let env = EnvLayer {
            base_url: Some("http://env:2".to_string()),
            mode: Some(TriageMode::Sort),
            token: None,
        };

        let config =
            TriageConfig::from_layers(None, toml.clone(), env.clone(), CliOverrides::default())
                .unwrap();
        assert_eq!(config.base_url(), "http://env:2");
        assert_eq!(config.mode(), TriageMode::Sort);

        let cli = CliOverrides {
            base_url: Some("http://cli:3".to_string()),
            mode: Some(TriageMode::Important),
        };
        let config = TriageConfig::from_layers(None, toml, env, cli).unwrap();
        assert_eq!(config.base_url(), "http://cli:3");
        assert_eq!(config.mode(), TriageMode::Important);
    }

    #[test]
    fn test_invalid_effective_base_url_is_an_error() {
        let cli = CliOverrides {
            base_url: Some("::::".to_string()),
            mode: None,
        };
        let result =
            TriageConfig::from_layers(None, TriageToml::default(), EnvLayer::default(), cli);
        assert!(result.is_err());
    }

    #[test]
    fn test_env_token_becomes_credential() {
        let env = EnvLayer {
            token: Some("  tok-123 ".to_string()),
            ..EnvLayer::default()
        };
        let config =
            TriageConfig::from_layers(None, TriageToml::default(), env, CliOverrides::default())
                .unwrap();
        assert_eq!(config.env_credential().map(|c| c.secret()), Some("tok-123"));

        let env = EnvLayer {
            token: Some("".to_string()),
            ..EnvLayer::default()
        };
        let config =
            TriageConfig::from_layers(None, TriageToml::default(), env, CliOverrides::default())
                .unwrap();
        assert!(config.env_credential().is_none());
    }

    #[test]
    fn test_credential_file_prefers_configured_path() {
        let dir = tempdir().unwrap();
        let mut toml = TriageToml::default();
        toml.session.credential_file = Some(dir.path().join("c.json"));
        let config =
            TriageConfig::from_layers(None, toml, EnvLayer::default(), CliOverrides::default())
                .unwrap();
        assert_eq!(config.credential_file(dir.path()), dir.path().join("c.json"));
    }

    #[test]
    fn test_timeout_and_reconcile_options() {
        let mut toml = TriageToml::default();
        toml.backend.timeout_secs = 7;
        toml.triage.remainder = false;
        let config =
            TriageConfig::from_layers(None, toml, EnvLayer::default(), CliOverrides::default())
                .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(7));
        assert!(!config.reconcile_options().remainder);
    }
}
