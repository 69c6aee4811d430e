//! Credential persistence and the one-shot login handoff.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use triage_common::Credential;

/// Query parameter the login flow delivers the credential in.
pub const TOKEN_PARAM: &str = "token";

/// Holds the credential between runs.
pub trait SessionStore: Send + Sync {
    fn get(&self) -> Result<Option<Credential>>;
    fn set(&self, credential: Credential) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    token: Credential,
}

/// Keeps the credential in a small JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let stored: StoredSession = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file: {}", self.path.display()))?;
        Ok(Credential::new(stored.token.secret()))
    }

    fn set(&self, credential: Credential) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&StoredSession { token: credential })
            .context("Failed to serialize session")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| {
                    format!("Failed to restrict session file: {}", self.path.display())
                })?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session file: {}", self.path.display())),
        }
    }
}

/// In-process store, for tests and `TRIAGE_TOKEN` sessions.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    credential: Mutex<Option<Credential>>,
}

impl MemorySessionStore {
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Mutex::new(Some(credential)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Result<Option<Credential>> {
        let guard = self
            .credential
            .lock()
            .map_err(|_| anyhow::anyhow!("Session lock poisoned"))?;
        Ok(guard.clone())
    }

    fn set(&self, credential: Credential) -> Result<()> {
        let mut guard = self
            .credential
            .lock()
            .map_err(|_| anyhow::anyhow!("Session lock poisoned"))?;
        *guard = Some(credential);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .credential
            .lock()
            .map_err(|_| anyhow::anyhow!("Session lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

/// Outcome of [`bootstrap_credential`].
#[derive(Debug)]
pub struct Bootstrap {
    /// The credential for this session, from the location or the store.
    pub credential: Option<Credential>,
    /// The incoming location with the token parameter removed.
    pub location: Url,
    /// True when the credential came from the location and was persisted.
    pub handed_off: bool,
}

/// Consumes a credential delivered in `location`'s query string.
///
/// A non-empty `token` parameter is persisted and stripped from the returned
/// location; other parameters are kept in order. Without one, the persisted
/// credential is used.
pub fn bootstrap_credential(location: &Url, store: &dyn SessionStore) -> Result<Bootstrap> {
    let mut token = None;
    let mut kept = Vec::new();
    for (key, value) in location.query_pairs() {
        if key == TOKEN_PARAM {
            token = token.or_else(|| Credential::new(value.into_owned()));
        } else {
            kept.push((key.into_owned(), value.into_owned()));
        }
    }

    let mut stripped = location.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(&kept);
    }

    match token {
        Some(credential) => {
            store.set(credential.clone())?;
            tracing::info!("Credential handed off through login redirect");
            Ok(Bootstrap {
                credential: Some(credential),
                location: stripped,
                handed_off: true,
            })
        }
        None => Ok(Bootstrap {
            credential: store.get()?,
            location: stripped,
            handed_off: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn credential(token: &str) -> Credential {
        Credential::new(token).unwrap()
    }

    // ── FileSessionStore ─────────────────────────────────────────────

    #[test]
    fn test_file_store_round_trip_and_clear() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("credential.json"));

        assert!(store.get().unwrap().is_none());
        store.set(credential("abc")).unwrap();
        assert_eq!(store.get().unwrap(), Some(credential("abc")));

        store.clear().unwrap();
        assert!(store.get().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_is_durable_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credential.json");
        FileSessionStore::new(&path).set(credential("persisted")).unwrap();

        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.get().unwrap(), Some(credential("persisted")));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credential.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FileSessionStore::new(&path).get().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("credential.json"));
        store.set(credential("abc")).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    // ── bootstrap_credential ─────────────────────────────────────────

    #[test]
    fn test_bootstrap_persists_and_strips_token() {
        let store = MemorySessionStore::default();
        let location = Url::parse("http://localhost:3000/?token=tok-1&view=issues").unwrap();

        let boot = bootstrap_credential(&location, &store).unwrap();

        assert!(boot.handed_off);
        assert_eq!(boot.credential, Some(credential("tok-1")));
        assert_eq!(boot.location.as_str(), "http://localhost:3000/?view=issues");
        assert_eq!(store.get().unwrap(), Some(credential("tok-1")));
    }

    #[test]
    fn test_bootstrap_removes_empty_query() {
        let store = MemorySessionStore::default();
        let location = Url::parse("http://localhost:3000/app?token=tok-1").unwrap();

        let boot = bootstrap_credential(&location, &store).unwrap();

        assert_eq!(boot.location.as_str(), "http://localhost:3000/app");
    }

    #[test]
    fn test_bootstrap_falls_back_to_store() {
        let store = MemorySessionStore::with_credential(credential("saved"));
        let location = Url::parse("http://localhost:3000/").unwrap();

        let boot = bootstrap_credential(&location, &store).unwrap();

        assert!(!boot.handed_off);
        assert_eq!(boot.credential, Some(credential("saved")));
    }

    #[test]
    fn test_bootstrap_ignores_empty_token() {
        let store = MemorySessionStore::with_credential(credential("saved"));
        let location = Url::parse("http://localhost:3000/?token=").unwrap();

        let boot = bootstrap_credential(&location, &store).unwrap();

        assert!(!boot.handed_off);
        assert_eq!(boot.credential, Some(credential("saved")));
        assert_eq!(boot.location.as_str(), "http://localhost:3000/");
    }

    #[test]
    fn test_bootstrap_without_any_credential() {
        let store = MemorySessionStore::default();
        let location = Url::parse("http://localhost:3000/").unwrap();

        let boot = bootstrap_credential(&location, &store).unwrap();

        assert!(boot.credential.is_none());
    }
}
