//! Global tunables stored alongside the collections

use serde::{Deserialize, Serialize};

/// The document's `config` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Minutes a done project waits before the archive sweep picks it up
    #[serde(default = "default_archive_minutes")]
    pub project_archive_minutes: u32,
}

fn default_archive_minutes() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_archive_minutes: default_archive_minutes(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_archive_minutes: Option<u32>,
}

impl SettingsPatch {
    pub fn apply(self, settings: &mut Settings) {
        if let Some(minutes) = self.project_archive_minutes {
            settings.project_archive_minutes = minutes;
        }
    }
}
