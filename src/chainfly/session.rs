use crate::core::AppError;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

/// Fixed key the bearer token is persisted under.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Durable key-value storage for session state.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Process-local store, used by tests and one-shot commands.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: DashMap<String, String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON object file, e.g. `~/.chainfly/session.json`:
/// `{"access_token": "..."}`.
///
/// Every write rewrites the whole file through a temp file + rename. There is
/// no locking across processes; two CLIs logging in at once race and the last
/// rename wins.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, AppError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&text).map_err(|e| {
            AppError::Store(format!("{} is not a session file: {e}", self.path.display()))
        })
    }

    /// Entries to rewrite from. A file that does not parse is treated as
    /// empty, the same way `Session::load` treats it as signed out; the flag
    /// reports whether that happened.
    fn read_for_write(&self) -> Result<(BTreeMap<String, String>, bool), AppError> {
        match self.read_all() {
            Err(AppError::Store(reason)) => {
                warn!(reason = %reason, "overwriting unreadable session file");
                Ok((BTreeMap::new(), true))
            }
            other => other.map(|entries| (entries, false)),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        // The mode only applies on creation, so a leftover temp file goes first.
        match std::fs::remove_file(&tmp) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp)?;
        file.write_all(&serde_json::to_vec_pretty(entries)?)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let (mut entries, _) = self.read_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        let (mut entries, reset) = self.read_for_write()?;
        if entries.remove(key).is_none() && !reset {
            return Ok(());
        }
        self.write_all(&entries)
    }
}

/// Bearer-token state for one client.
///
/// The token is cached in memory and mirrored to the store: written on set,
/// removed on clear. The store is read once, at construction. Cloning shares
/// the same state.
#[derive(Clone)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
    store: Arc<dyn TokenStore>,
}

impl Session {
    pub fn load(store: Arc<dyn TokenStore>) -> Self {
        let token = match store.get(ACCESS_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "could not read stored session; starting signed out");
                None
            }
        };
        if let Some(t) = &token {
            info!(token_fingerprint = %fingerprint(t), "restored session token");
        }
        Self {
            token: Arc::new(RwLock::new(token)),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemoryTokenStore::new()))
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Replace the token (`None` or blank clears it). Store failures are
    /// logged; the in-memory token is updated regardless.
    pub fn set_token(&self, token: Option<&str>) {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token.clone();

        let persisted = match &token {
            Some(t) => {
                info!(token_fingerprint = %fingerprint(t), "session token set");
                self.store.set(ACCESS_TOKEN_KEY, t)
            }
            None => {
                info!("session token cleared");
                self.store.remove(ACCESS_TOKEN_KEY)
            }
        };
        if let Err(e) = persisted {
            warn!(error = %e, "failed to persist session token");
        }
    }

    pub fn clear(&self) {
        self.set_token(None);
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

/// Short, non-reversible token identifier for logs.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_mirror_to_store() {
        let store = Arc::new(MemoryTokenStore::new());
        let session = Session::load(store.clone());
        assert!(!session.is_authenticated());

        session.set_token(Some("abc"));
        assert_eq!(session.token().as_deref(), Some("abc"));
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("abc"));

        session.clear();
        assert_eq!(session.token(), None);
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn blank_token_counts_as_clear() {
        let session = Session::in_memory();
        session.set_token(Some("abc"));
        session.set_token(Some("   "));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn construction_reads_store_once() {
        let store = Arc::new(MemoryTokenStore::new());
        store.set(ACCESS_TOKEN_KEY, "persisted").unwrap();
        let session = Session::load(store.clone());
        assert_eq!(session.token().as_deref(), Some("persisted"));

        // Out-of-band writes are not observed by an existing session.
        store.set(ACCESS_TOKEN_KEY, "other").unwrap();
        assert_eq!(session.token().as_deref(), Some("persisted"));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let session = Session::load(Arc::new(FileTokenStore::new(&path)));
        session.set_token(Some("tok-1"));
        assert!(path.exists());

        let reloaded = Session::load(Arc::new(FileTokenStore::new(&path)));
        assert_eq!(reloaded.token().as_deref(), Some("tok-1"));

        reloaded.clear();
        let store = FileTokenStore::new(&path);
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn file_store_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));
        store.set("refresh_token", "r").unwrap();
        store.set(ACCESS_TOKEN_KEY, "a").unwrap();
        store.remove(ACCESS_TOKEN_KEY).unwrap();
        assert_eq!(store.get("refresh_token").unwrap().as_deref(), Some("r"));
    }

    #[test]
    fn corrupt_file_starts_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(matches!(store.get(ACCESS_TOKEN_KEY), Err(AppError::Store(_))));
        let session = Session::load(Arc::new(store));
        assert!(!session.is_authenticated());

        // A new sign-in replaces the broken file.
        session.set_token(Some("fresh"));
        let reloaded = Session::load(Arc::new(FileTokenStore::new(&path)));
        assert_eq!(reloaded.token().as_deref(), Some("fresh"));
    }

    #[test]
    fn sign_out_repairs_a_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ broken").unwrap();

        let store = FileTokenStore::new(&path);
        store.remove(ACCESS_TOKEN_KEY).unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        // A stale world-readable temp file must not keep its mode.
        std::fs::write(path.with_extension("json.tmp"), "{}").unwrap();
        std::fs::set_permissions(
            path.with_extension("json.tmp"),
            std::fs::Permissions::from_mode(0o644),
        )
        .unwrap();

        let store = FileTokenStore::new(&path);
        store.set(ACCESS_TOKEN_KEY, "secret").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn fingerprint_is_short_and_stable() {
        let fp = fingerprint("secret");
        assert_eq!(fp.len(), 12);
        assert_eq!(fp, fingerprint("secret"));
        assert_ne!(fp, fingerprint("secret2"));
    }
}
