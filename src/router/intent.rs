use anyhow::Result;
use serde::Deserialize;

use crate::{
    app::AppController,
    error::RouteError,
    models::{SettingsPatch, ThemePreference},
    state::{AppState, View},
};

/// A callback fired by one of the screens.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Intent {
    CompleteOnboarding,
    Login {
        email: String,
        password: String,
    },
    Signup {
        email: String,
        password: String,
        name: String,
    },
    SwitchToSignup,
    SwitchToLogin,
    StartAnalysis,
    ViewProfile,
    Logout,
    Capture {
        image: String,
    },
    CancelCapture,
    NewAnalysis,
    BackToDashboard,
    UpdateSettings {
        settings: SettingsPatch,
    },
    ExportData,
    SetTheme {
        theme: ThemePreference,
    },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::CompleteOnboarding => "completeOnboarding",
            Intent::Login { .. } => "login",
            Intent::Signup { .. } => "signup",
            Intent::SwitchToSignup => "switchToSignup",
            Intent::SwitchToLogin => "switchToLogin",
            Intent::StartAnalysis => "startAnalysis",
            Intent::ViewProfile => "viewProfile",
            Intent::Logout => "logout",
            Intent::Capture { .. } => "capture",
            Intent::CancelCapture => "cancelCapture",
            Intent::NewAnalysis => "newAnalysis",
            Intent::BackToDashboard => "backToDashboard",
            Intent::UpdateSettings { .. } => "updateSettings",
            Intent::ExportData => "exportData",
            Intent::SetTheme { .. } => "setTheme",
        }
    }

    /// Whether the screen for `view` exposes this callback.
    pub fn is_available_on(&self, view: &View) -> bool {
        match self {
            Intent::CompleteOnboarding => matches!(view, View::Onboarding),
            Intent::Login { .. } | Intent::SwitchToSignup => matches!(view, View::Login),
            Intent::Signup { .. } | Intent::SwitchToLogin => matches!(view, View::Signup),
            Intent::StartAnalysis | Intent::ViewProfile => matches!(view, View::Dashboard),
            Intent::Logout => matches!(view, View::Dashboard | View::Profile),
            Intent::Capture { .. } | Intent::CancelCapture => matches!(view, View::Camera),
            Intent::NewAnalysis => view.is_results(),
            Intent::BackToDashboard => matches!(view, View::Results { .. } | View::Profile),
            Intent::UpdateSettings { .. } | Intent::ExportData => matches!(view, View::Profile),
            Intent::SetTheme { .. } => !matches!(view, View::Loading),
        }
    }
}

impl AppController {
    /// Runs the dispatcher operation behind `intent` and returns the
    /// resulting state.
    pub async fn handle(&self, intent: Intent) -> Result<AppState> {
        let view = self.snapshot().await.view;
        if !intent.is_available_on(&view) {
            return Err(RouteError::Unavailable {
                intent: intent.name(),
                view: view.name(),
            }
            .into());
        }

        let state = match intent {
            Intent::CompleteOnboarding => self.complete_onboarding().await,
            Intent::Login { email, password } => {
                self.login(&email, &password).await?;
                self.snapshot().await
            }
            Intent::Signup {
                email,
                password,
                name,
            } => {
                self.signup(&email, &password, &name).await?;
                self.snapshot().await
            }
            Intent::SwitchToSignup => self.set_view(View::Signup).await,
            Intent::SwitchToLogin => self.set_view(View::Login).await,
            Intent::StartAnalysis => self.set_view(View::Camera).await,
            Intent::CancelCapture => self.set_view(View::Dashboard).await,
            Intent::ViewProfile => self.set_view(View::Profile).await,
            Intent::Logout => self.logout().await,
            Intent::Capture { image } => self.capture_image(image).await?,
            Intent::NewAnalysis => self.new_analysis().await,
            Intent::BackToDashboard => self.back_to_dashboard().await,
            Intent::UpdateSettings { settings } => self.update_settings(settings).await,
            Intent::ExportData => {
                self.export_data().await?;
                self.snapshot().await
            }
            Intent::SetTheme { theme } => {
                self.set_theme(theme).await?;
                self.snapshot().await
            }
        };

        Ok(state)
    }
}
