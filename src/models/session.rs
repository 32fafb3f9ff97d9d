use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemePreference::Light),
            "dark" => Some(ThemePreference::Dark),
            "system" => Some(ThemePreference::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub notifications: bool,
    pub dark_mode: ThemePreference,
    pub language: String,
    pub units: Units,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notifications: true,
            dark_mode: ThemePreference::System,
            language: "en".into(),
            units: Units::Metric,
        }
    }
}

/// The signed-in user.
///
/// Serialized under the `user` key of the persisted blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    pub email: String,
    pub join_date: DateTime<Utc>,
    pub total_analyses: u32,
    /// 0-100, overwritten by every completed analysis.
    pub health_score: u8,
    #[serde(default)]
    pub last_analysis: Option<NaiveDate>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl Session {
    pub fn new(id: String, name: String, email: String, join_date: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            email,
            join_date,
            total_analyses: 0,
            health_score: 0,
            last_analysis: None,
            preferences: Preferences::default(),
        }
    }

    /// Initials shown in the avatar, e.g. "Jo Doe" -> "JD".
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }
}
