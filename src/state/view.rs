use serde::{Deserialize, Serialize};

/// Progress of the analysis behind the results screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum AnalysisPhase {
    #[default]
    Analyzing,
    #[serde(rename_all = "camelCase")]
    Complete { record_id: String },
    Failed { message: String },
}

/// Which screen the router shows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum View {
    #[default]
    Loading,
    Onboarding,
    Login,
    Signup,
    Dashboard,
    Camera,
    Results { phase: AnalysisPhase },
    Profile,
}

impl View {
    pub fn results() -> Self {
        View::Results {
            phase: AnalysisPhase::Analyzing,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            View::Loading => "loading",
            View::Onboarding => "onboarding",
            View::Login => "login",
            View::Signup => "signup",
            View::Dashboard => "dashboard",
            View::Camera => "camera",
            View::Results { .. } => "results",
            View::Profile => "profile",
        }
    }

    /// Views that only make sense with a signed-in user.
    pub fn requires_session(&self) -> bool {
        matches!(
            self,
            View::Dashboard | View::Camera | View::Results { .. } | View::Profile
        )
    }

    pub fn is_results(&self) -> bool {
        matches!(self, View::Results { .. })
    }
}
