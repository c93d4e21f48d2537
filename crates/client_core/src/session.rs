//! Persisted session record and the process-wide session handle.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use shared::domain::UserId;
use tracing::{debug, info, warn};

/// Storage key the session record lives under.
pub const SESSION_STORAGE_KEY: &str = "session";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<SessionRecord>>;
    fn save(&self, record: &SessionRecord) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    record: Mutex<Option<SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: SessionRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionRecord>> {
        let guard = self
            .record
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        let mut guard = self
            .record
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        *guard = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .record
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

/// Key-value JSON file holding the session under [`SESSION_STORAGE_KEY`]. Other keys
/// in the file are preserved.
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

    fn read_entries(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read session file '{}'", self.path.display())
                });
            }
        };

        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&raw)
            .with_context(|| format!("malformed session file '{}'", self.path.display()))
    }

    fn write_entries(&self, entries: &BTreeMap<String, serde_json::Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!(
                    "failed to create parent directory '{}' for session file",
                    parent.display()
                )
            })?;
        }
        let serialized = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write session file '{}'", self.path.display()))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionRecord>> {
        let entries = self.read_entries()?;
        entries
            .get(SESSION_STORAGE_KEY)
            .cloned()
            .map(serde_json::from_value::<SessionRecord>)
            .transpose()
            .context("stored session record has an unexpected shape")
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(err) => {
                warn!("discarding unreadable session file contents: {err:#}");
                BTreeMap::new()
            }
        };
        entries.insert(
            SESSION_STORAGE_KEY.to_string(),
            serde_json::to_value(record)?,
        );
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(SESSION_STORAGE_KEY).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}

/// Session shared by every screen. Loaded once at startup, replaced on login and
/// cleared on logout; consumers receive it explicitly.
pub struct Session {
    store: Arc<dyn SessionStore>,
    current: Option<SessionRecord>,
}

impl Session {
    pub fn init(store: Arc<dyn SessionStore>) -> Result<Self> {
        let current = store.load()?;
        debug!(restored = current.is_some(), "session initialized");
        Ok(Self { store, current })
    }

    pub fn current(&self) -> Option<&SessionRecord> {
        self.current.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.current.as_ref().and_then(|record| record.user_id)
    }

    pub fn token(&self) -> Option<&str> {
        self.current
            .as_ref()
            .and_then(|record| record.token.as_deref())
    }

    pub fn is_established(&self) -> bool {
        self.current.is_some()
    }

    pub fn establish(&mut self, record: SessionRecord) -> Result<()> {
        self.store.save(&record)?;
        info!(user_id = ?record.user_id, "session established");
        self.current = Some(record);
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        self.store.clear()?;
        self.current = None;
        info!("session cleared");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
