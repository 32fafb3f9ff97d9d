use serde::{Deserialize, Serialize};

use crate::models::{AnalysisRecord, CapturedImage, Session, Settings, SettingsPatch};

use super::{AnalysisPhase, View};

/// The slice of [`AppState`] mirrored to device storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub user: Option<Session>,
    #[serde(default = "default_first_time")]
    pub is_first_time: bool,
    #[serde(default)]
    pub analysis_history: Vec<AnalysisRecord>,
    #[serde(default)]
    pub settings: Settings,
}

fn default_first_time() -> bool {
    true
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            user: None,
            is_first_time: true,
            analysis_history: Vec::new(),
            settings: Settings::default(),
        }
    }
}

impl PersistedState {
    /// View to open on after restoring this state.
    pub fn resume_view(&self) -> View {
        if self.user.is_some() {
            View::Dashboard
        } else if !self.is_first_time {
            View::Login
        } else {
            View::Onboarding
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub view: View,
    pub session: Option<Session>,
    pub captured_image: Option<CapturedImage>,
    pub auth_loading: bool,
    pub auth_error: Option<String>,
    pub is_first_time: bool,
    /// Most recent first.
    pub analysis_history: Vec<AnalysisRecord>,
    pub settings: Settings,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            view: View::Loading,
            session: None,
            captured_image: None,
            auth_loading: false,
            auth_error: None,
            is_first_time: true,
            analysis_history: Vec::new(),
            settings: Settings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetView(View),
    SetSession(Option<Session>),
    SetCapturedImage(Option<CapturedImage>),
    SetAuthLoading(bool),
    SetAuthError(Option<String>),
    SetFirstTime(bool),
    AddAnalysis(AnalysisRecord),
    AnalysisFailed(String),
    UpdateSettings(SettingsPatch),
    LoadPersistedState(PersistedState),
    ClearSessionData,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetView(_) => "SetView",
            Action::SetSession(_) => "SetSession",
            Action::SetCapturedImage(_) => "SetCapturedImage",
            Action::SetAuthLoading(_) => "SetAuthLoading",
            Action::SetAuthError(_) => "SetAuthError",
            Action::SetFirstTime(_) => "SetFirstTime",
            Action::AddAnalysis(_) => "AddAnalysis",
            Action::AnalysisFailed(_) => "AnalysisFailed",
            Action::UpdateSettings(_) => "UpdateSettings",
            Action::LoadPersistedState(_) => "LoadPersistedState",
            Action::ClearSessionData => "ClearSessionData",
        }
    }
}

impl AppState {
    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            user: self.session.clone(),
            is_first_time: self.is_first_time,
            analysis_history: self.analysis_history.clone(),
            settings: self.settings.clone(),
        }
    }

    /// True when `other` differs in any field that is written to storage.
    pub fn persisted_differs(&self, other: &AppState) -> bool {
        self.session != other.session
            || self.is_first_time != other.is_first_time
            || self.analysis_history != other.analysis_history
            || self.settings != other.settings
    }

    /// Applies the reachability rules to a requested view.
    fn guard_view(&self, requested: View) -> View {
        if requested.requires_session() && self.session.is_none() {
            return View::Login;
        }
        if requested.is_results() && self.captured_image.is_none() {
            return View::Camera;
        }
        requested
    }

    pub fn record(&self, id: &str) -> Option<&AnalysisRecord> {
        self.analysis_history.iter().find(|record| record.id == id)
    }
}

/// Pure transition function. No I/O, clock or randomness.
pub fn reduce(state: &AppState, action: Action) -> AppState {
    let mut next = state.clone();

    match action {
        Action::SetView(view) => {
            next.view = state.guard_view(view);
        }
        Action::SetSession(session) => {
            next.session = session;
            if next.view.requires_session() && next.session.is_none() {
                next.view = View::Login;
            }
        }
        Action::SetCapturedImage(image) => {
            next.captured_image = image;
            if next.captured_image.is_none() && next.view.is_results() {
                next.view = View::Camera;
            }
        }
        Action::SetAuthLoading(loading) => {
            next.auth_loading = loading;
        }
        Action::SetAuthError(error) => {
            next.auth_error = error.filter(|message| !message.is_empty());
        }
        Action::SetFirstTime(first_time) => {
            next.is_first_time = first_time;
        }
        Action::AddAnalysis(record) => {
            if let Some(session) = next.session.as_mut() {
                session.total_analyses = session.total_analyses.saturating_add(1);
                session.last_analysis = Some(record.date);
                session.health_score = record.health_score;
            }
            if next.view.is_results() {
                next.view = View::Results {
                    phase: AnalysisPhase::Complete {
                        record_id: record.id.clone(),
                    },
                };
            }
            next.analysis_history.insert(0, record);
        }
        Action::AnalysisFailed(message) => {
            if next.view.is_results() {
                next.view = View::Results {
                    phase: AnalysisPhase::Failed { message },
                };
            }
        }
        Action::UpdateSettings(patch) => {
            next.settings = state.settings.merged(&patch);
        }
        Action::LoadPersistedState(persisted) => {
            next.session = persisted.user;
            next.is_first_time = persisted.is_first_time;
            next.analysis_history = persisted.analysis_history;
            next.settings = persisted.settings;
        }
        Action::ClearSessionData => {
            next.session = None;
            next.captured_image = None;
            next.analysis_history.clear();
            next.view = View::Login;
        }
    }

    next
}
