//! Configuration service implementation.
//!
//! Loads `config.toml` once, writes the defaults on first run and caches the
//! validated result.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use callsignal_core::config::ConfigRoot;
use callsignal_core::error::{CallSignalError, Result};

use crate::paths::CallSignalPaths;
use crate::storage::AtomicTomlFile;

#[derive(Debug, Clone)]
pub struct ConfigService {
    file: AtomicTomlFile<ConfigRoot>,
    config: Arc<RwLock<Option<ConfigRoot>>>,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Service for `config.toml` under `base`, or the default config dir.
    pub fn from_paths(paths: &CallSignalPaths) -> Result<Self> {
        Ok(Self::new(paths.config_file()?))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Returns the cached configuration, loading it on first access.
    ///
    /// # Errors
    ///
    /// A malformed file or a configuration that fails validation.
    pub fn get_config(&self) -> Result<ConfigRoot> {
        {
            let read_lock = self
                .config
                .read()
                .map_err(|_| CallSignalError::internal("config cache poisoned"))?;
            if let Some(cached) = read_lock.as_ref() {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load_config()?;

        let mut write_lock = self
            .config
            .write()
            .map_err(|_| CallSignalError::internal("config cache poisoned"))?;
        *write_lock = Some(loaded.clone());
        Ok(loaded)
    }

    /// Forces a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    fn load_config(&self) -> Result<ConfigRoot> {
        let config = match self.file.load()? {
            Some(config) => config,
            None => {
                let config = ConfigRoot::default();
                self.file.save(&config)?;
                tracing::info!(
                    target: "config",
                    path = %self.file.path().display(),
                    "wrote default configuration"
                );
                config
            }
        };
        config.validate()?;
        Ok(config)
    }
}
