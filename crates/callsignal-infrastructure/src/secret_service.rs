//! Secret service implementation backed by `secret.json`.
//!
//! The `GEMINI_API_KEY` environment variable, when set and non-blank, takes
//! precedence over the key stored in the file.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use callsignal_core::config::{GeminiConfig, SecretConfig};
use callsignal_core::error::{CallSignalError, Result};
use callsignal_core::secret::SecretService;

use crate::paths::CallSignalPaths;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone)]
pub struct SecretServiceImpl {
    path: PathBuf,
    read_env: bool,
    secrets: Arc<RwLock<Option<SecretConfig>>>,
}

impl SecretServiceImpl {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            read_env: true,
            secrets: Arc::new(RwLock::new(None)),
        }
    }

    pub fn from_paths(paths: &CallSignalPaths) -> Result<Self> {
        Ok(Self::new(paths.secret_file()?))
    }

    /// Ignores `GEMINI_API_KEY`; the file is the only source.
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    fn load_secrets_internal(&self) -> Result<SecretConfig> {
        {
            let read_lock = self
                .secrets
                .read()
                .map_err(|_| CallSignalError::internal("secret cache poisoned"))?;
            if let Some(cached) = read_lock.as_ref() {
                return Ok(cached.clone());
            }
        }

        let mut loaded = if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            if content.trim().is_empty() {
                SecretConfig::default()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            SecretConfig::default()
        };

        if self.read_env {
            if let Ok(key) = std::env::var(GEMINI_API_KEY_ENV) {
                apply_env_key(&mut loaded, key);
            }
        }

        let mut write_lock = self
            .secrets
            .write()
            .map_err(|_| CallSignalError::internal("secret cache poisoned"))?;
        *write_lock = Some(loaded.clone());
        Ok(loaded)
    }
}

fn apply_env_key(secrets: &mut SecretConfig, key: String) {
    if key.trim().is_empty() {
        return;
    }
    match secrets.gemini.as_mut() {
        Some(gemini) => gemini.api_key = key,
        None => {
            secrets.gemini = Some(GeminiConfig {
                api_key: key,
                model_name: None,
            })
        }
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig> {
        self.load_secrets_internal()
    }

    async fn secret_file_exists(&self) -> bool {
        self.path.exists()
    }
}
