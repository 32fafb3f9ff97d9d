use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Score recorded when the analysis did not report one.
pub const DEFAULT_HEALTH_SCORE: u8 = 85;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisStatus {
    #[default]
    Normal,
    Elevated,
    Low,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Normal => "normal",
            AnalysisStatus::Elevated => "elevated",
            AnalysisStatus::Low => "low",
        }
    }
}

/// Opaque reference to a captured still image (data URL, file URI, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CapturedImage(String);

impl CapturedImage {
    /// Returns `None` for an empty reference, which the camera layer uses for
    /// "nothing captured".
    pub fn new(data: impl Into<String>) -> Option<Self> {
        let data = data.into();
        if data.is_empty() {
            None
        } else {
            Some(Self(data))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParameterReading {
    pub value: String,
    pub status: AnalysisStatus,
}

impl ParameterReading {
    pub fn new(value: impl Into<String>, status: AnalysisStatus) -> Self {
        Self {
            value: value.into(),
            status,
        }
    }
}

/// Raw output of a sample analysis, before it becomes a history record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AnalysisStatus>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterReading>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: String,
    pub date: NaiveDate,
    /// Local time of day, `HH:MM`.
    pub time: String,
    pub image_data: Option<CapturedImage>,
    pub results: AnalysisResults,
    pub health_score: u8,
    pub status: AnalysisStatus,
}

impl AnalysisRecord {
    /// Score and status are fixed here and never recomputed afterwards. A
    /// missing or zero score reads as [`DEFAULT_HEALTH_SCORE`].
    pub fn from_results(
        id: String,
        date: NaiveDate,
        time: String,
        image_data: Option<CapturedImage>,
        results: AnalysisResults,
    ) -> Self {
        let health_score = results
            .overall_score
            .filter(|score| *score > 0)
            .unwrap_or(DEFAULT_HEALTH_SCORE)
            .min(100);
        let status = results.status.unwrap_or_default();

        Self {
            id,
            date,
            time,
            image_data,
            results,
            health_score,
            status,
        }
    }
}
