//! Waitlist repositories: process memory for demos, a TOML file otherwise.

use std::path::PathBuf;

use async_trait::async_trait;
use callsignal_core::error::{CallSignalError, Result};
use callsignal_core::waitlist::{WaitlistEntry, WaitlistRepository, normalize_email};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::paths::CallSignalPaths;
use crate::storage::AtomicTomlFile;

/// Sign-ups held only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryWaitlistRepository {
    entries: RwLock<Vec<WaitlistEntry>>,
}

impl InMemoryWaitlistRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WaitlistRepository for InMemoryWaitlistRepository {
    async fn contains_email(&self, email: &str) -> Result<bool> {
        let key = normalize_email(email);
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .any(|entry| normalize_email(&entry.email) == key))
    }

    /// Re-checks under the write lock, same contract as the TOML store.
    async fn insert(&self, entry: WaitlistEntry) -> Result<()> {
        let key = normalize_email(&entry.email);
        let mut entries = self.entries.write().await;
        if entries
            .iter()
            .any(|existing| normalize_email(&existing.email) == key)
        {
            return Err(CallSignalError::validation("Email already on waitlist"));
        }
        entries.push(entry);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WaitlistEntry>> {
        Ok(self.entries.read().await.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WaitlistDocument {
    #[serde(default)]
    entries: Vec<WaitlistEntry>,
}

/// Sign-ups persisted in `waitlist.toml` as an `[[entries]]` array.
#[derive(Debug, Clone)]
pub struct TomlWaitlistRepository {
    file: AtomicTomlFile<WaitlistDocument>,
}

impl TomlWaitlistRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    pub fn from_paths(paths: &CallSignalPaths) -> Result<Self> {
        Ok(Self::new(paths.waitlist_file()?))
    }

    fn document(&self) -> Result<WaitlistDocument> {
        Ok(self.file.load()?.unwrap_or_default())
    }
}

#[async_trait]
impl WaitlistRepository for TomlWaitlistRepository {
    async fn contains_email(&self, email: &str) -> Result<bool> {
        let key = normalize_email(email);
        Ok(self
            .document()?
            .entries
            .iter()
            .any(|entry| normalize_email(&entry.email) == key))
    }

    /// Re-checks for the email under the file lock so two writers cannot
    /// both insert the same address.
    async fn insert(&self, entry: WaitlistEntry) -> Result<()> {
        let key = normalize_email(&entry.email);
        self.file.update(WaitlistDocument::default(), move |document| {
            if document
                .entries
                .iter()
                .any(|existing| normalize_email(&existing.email) == key)
            {
                return Err(CallSignalError::validation("Email already on waitlist"));
            }
            document.entries.push(entry);
            Ok(())
        })
    }

    async fn list(&self) -> Result<Vec<WaitlistEntry>> {
        Ok(self.document()?.entries)
    }
}
