use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    insights::{self, Achievement, DashboardSummary, ScoreBand},
    models::{AnalysisRecord, CapturedImage, Session, Settings},
    state::{AnalysisPhase, AppState, View},
};
use crate::log_warn;

const ENABLE_LOGS: bool = true;

/// What a screen gets to see of the application state.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "screen", rename_all = "camelCase")]
pub enum Screen<'a> {
    Loading,
    Onboarding,
    Login {
        error: Option<&'a str>,
        loading: bool,
    },
    Signup {
        error: Option<&'a str>,
        loading: bool,
    },
    Dashboard {
        user: &'a Session,
        history: &'a [AnalysisRecord],
        summary: DashboardSummary,
    },
    Camera,
    Results {
        image: &'a CapturedImage,
        phase: &'a AnalysisPhase,
        record: Option<&'a AnalysisRecord>,
    },
    #[serde(rename_all = "camelCase")]
    Profile {
        user: &'a Session,
        settings: &'a Settings,
        score_band: ScoreBand,
        score_label: &'static str,
        achievements: Vec<Achievement>,
    },
}

/// Picks the screen for the current view. `None` means the state breaks a
/// reachability rule and nothing should be drawn.
pub fn route(state: &AppState, today: NaiveDate) -> Option<Screen<'_>> {
    let screen = match &state.view {
        View::Loading => Screen::Loading,
        View::Onboarding => Screen::Onboarding,
        View::Login => Screen::Login {
            error: state.auth_error.as_deref(),
            loading: state.auth_loading,
        },
        View::Signup => Screen::Signup {
            error: state.auth_error.as_deref(),
            loading: state.auth_loading,
        },
        View::Dashboard => {
            let user = signed_in(state)?;
            Screen::Dashboard {
                user,
                history: &state.analysis_history,
                summary: insights::dashboard_summary(user, &state.analysis_history, today),
            }
        }
        View::Camera => {
            signed_in(state)?;
            Screen::Camera
        }
        View::Results { phase } => {
            signed_in(state)?;
            let Some(image) = state.captured_image.as_ref() else {
                log_warn!("results view without a captured image; rendering nothing");
                return None;
            };
            let record = match phase {
                AnalysisPhase::Complete { record_id } => state.record(record_id),
                _ => None,
            };
            Screen::Results {
                image,
                phase,
                record,
            }
        }
        View::Profile => {
            let user = signed_in(state)?;
            let score_band = ScoreBand::for_score(user.health_score);
            Screen::Profile {
                user,
                settings: &state.settings,
                score_band,
                score_label: score_band.label(),
                achievements: insights::achievements(user),
            }
        }
    };

    Some(screen)
}

fn signed_in(state: &AppState) -> Option<&Session> {
    if state.session.is_none() {
        log_warn!("{} view without a session; rendering nothing", state.view.name());
    }
    state.session.as_ref()
}
