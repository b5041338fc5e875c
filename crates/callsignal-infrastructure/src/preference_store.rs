//! Dashboard preferences persisted between runs: the drivers panel width and
//! the driver tape.

use std::path::PathBuf;

use callsignal_core::dashboard::restore_panel_width;
use callsignal_core::error::Result;
use callsignal_core::tape::{DriverTape, TapeEntry};
use serde::{Deserialize, Serialize};

use crate::paths::CallSignalPaths;
use crate::storage::AtomicTomlFile;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    drivers_panel_width_px: Option<f64>,
    #[serde(default)]
    driver_tape: Vec<TapeEntry>,
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    file: AtomicTomlFile<Preferences>,
}

impl PreferenceStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    pub fn from_paths(paths: &CallSignalPaths) -> Result<Self> {
        Ok(Self::new(paths.preferences_file()?))
    }

    /// A corrupt file is logged and treated as empty.
    fn load(&self) -> Preferences {
        match self.file.load() {
            Ok(preferences) => preferences.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(target: "preferences", error = %e, "ignoring unreadable preferences");
                Preferences::default()
            }
        }
    }

    /// Saved width clamped to the minimum, or the default width.
    pub fn panel_width(&self) -> f64 {
        restore_panel_width(self.load().drivers_panel_width_px)
    }

    pub fn save_panel_width(&self, width: f64) -> Result<()> {
        self.file.update(Preferences::default(), |preferences| {
            preferences.drivers_panel_width_px = Some(width);
            Ok(())
        })
    }

    pub fn driver_tape(&self) -> DriverTape {
        DriverTape::from_entries(self.load().driver_tape)
    }

    pub fn save_driver_tape(&self, tape: &DriverTape) -> Result<()> {
        let entries = tape.to_vec();
        self.file.update(Preferences::default(), move |preferences| {
            preferences.driver_tape = entries;
            Ok(())
        })
    }
}
