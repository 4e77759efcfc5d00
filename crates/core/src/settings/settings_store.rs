use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::SettingsRepositoryTrait;
use crate::errors::{Error, Result};
use crate::settings::AnalysisSettings;

/// Settings kept as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsRepositoryTrait for SettingsStore {
    fn load_settings(&self) -> Result<AnalysisSettings> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No settings at {}, using defaults", self.path.display());
                return Ok(AnalysisSettings::default());
            }
            Err(e) => {
                return Err(Error::ConfigIO(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        let settings: AnalysisSettings = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    fn save_settings(&self, settings: &AnalysisSettings) -> Result<()> {
        settings.validate()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| Error::ConfigIO(format!("{}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)
            .map_err(|e| Error::ConfigIO(format!("{}: {}", self.path.display(), e)))
    }
}
