//! Repository trait for analysis settings.

use crate::errors::Result;
use crate::settings::AnalysisSettings;

/// Persistence for [`AnalysisSettings`].
pub trait SettingsRepositoryTrait: Send + Sync {
    /// Stored settings, or defaults when nothing has been saved yet.
    fn load_settings(&self) -> Result<AnalysisSettings>;

    /// Replace the stored settings.
    fn save_settings(&self, settings: &AnalysisSettings) -> Result<()>;
}
