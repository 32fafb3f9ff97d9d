use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PrivacySettings {
    pub analytics: bool,
    pub crash_reporting: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            analytics: true,
            crash_reporting: true,
        }
    }
}

/// Device-level preferences. Survive logout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub notifications: bool,
    pub reminders: bool,
    /// Days of history to keep.
    pub data_retention: u32,
    pub export_format: ExportFormat,
    pub privacy: PrivacySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications: true,
            reminders: true,
            data_retention: 365,
            export_format: ExportFormat::Pdf,
            privacy: PrivacySettings::default(),
        }
    }
}

/// Partial update for [`Settings`]. Absent fields are left alone; a present
/// `privacy` block replaces the stored one wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_retention: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_format: Option<ExportFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<PrivacySettings>,
}

impl Settings {
    pub fn merged(&self, patch: &SettingsPatch) -> Settings {
        Settings {
            notifications: patch.notifications.unwrap_or(self.notifications),
            reminders: patch.reminders.unwrap_or(self.reminders),
            data_retention: patch.data_retention.unwrap_or(self.data_retention),
            export_format: patch.export_format.unwrap_or(self.export_format),
            privacy: patch.privacy.clone().unwrap_or_else(|| self.privacy.clone()),
        }
    }
}
