//! Path management for callsignal configuration and data files.
//!
//! ```text
//! ~/.config/callsignal/
//! ├── config.toml        # Simulator, analysis and dashboard settings
//! ├── secret.json        # Gemini API key
//! ├── preferences.toml   # Driver tape and panel width
//! └── waitlist.toml      # Local waitlist store
//! ```

use std::path::{Path, PathBuf};

use callsignal_core::config::{DEFAULT_GEMINI_MODEL, GeminiConfig, SecretConfig};
use callsignal_core::error::{CallSignalError, Result};

const APP_DIR: &str = "callsignal";

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

impl From<PathError> for CallSignalError {
    fn from(err: PathError) -> Self {
        CallSignalError::config(err.to_string())
    }
}

/// Resolves every file the application reads or writes.
///
/// With a base directory all files live directly under it, which is how
/// tests and `--config-dir` style overrides isolate themselves.
#[derive(Debug, Clone, Default)]
pub struct CallSignalPaths {
    base: Option<PathBuf>,
}

impl CallSignalPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// `~/.config/callsignal` unless a base directory was given.
    pub fn config_dir(&self) -> std::result::Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> std::result::Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn secret_file(&self) -> std::result::Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("secret.json"))
    }

    pub fn preferences_file(&self) -> std::result::Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("preferences.toml"))
    }

    pub fn waitlist_file(&self) -> std::result::Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("waitlist.toml"))
    }

    /// Writes a `secret.json` template with an empty key if none exists.
    ///
    /// On Unix the file is restricted to mode 600.
    pub fn ensure_secret_file(&self) -> Result<PathBuf> {
        let secret_path = self.secret_file()?;
        if secret_path.exists() {
            return Ok(secret_path);
        }
        if let Some(parent) = secret_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: String::new(),
                model_name: Some(DEFAULT_GEMINI_MODEL.to_string()),
            }),
        };
        std::fs::write(&secret_path, serde_json::to_string_pretty(&template)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&secret_path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::info!(target: "paths", path = %secret_path.display(), "created secret template");
        Ok(secret_path)
    }
}
