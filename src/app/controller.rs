use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    backend::{validation, BackendClient, MockBackend},
    config::AppConfig,
    error::{AnalysisError, AuthError},
    insights::ExportBundle,
    models::{
        AnalysisRecord, AnalysisResults, CapturedImage, Session, SettingsPatch, ThemePreference,
    },
    notify::{LogNotifier, Notification, Notifier},
    state::{reduce, Action, AppState, View},
    store::{Database, StateRepository},
};
use crate::{log_debug, log_error, log_info};

const ENABLE_LOGS: bool = true;

struct PendingAnalysis {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Clears the in-flight auth flag when the attempt finishes, however it ends.
struct AuthAttempt {
    flag: Arc<AtomicBool>,
}

impl Drop for AuthAttempt {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Owns the application state and runs every effect against it.
///
/// All mutation goes through [`AppController::dispatch`]; the intent-level
/// methods sequence dispatches around the (simulated) backend.
#[derive(Clone)]
pub struct AppController {
    state: Arc<Mutex<AppState>>,
    updates: watch::Sender<AppState>,
    repository: StateRepository,
    backend: Arc<dyn BackendClient>,
    notifier: Arc<dyn Notifier>,
    config: AppConfig,
    shutdown: CancellationToken,
    /// Child of `shutdown`; replaced on logout so effects started for the
    /// previous user never land.
    session_token: Arc<std::sync::Mutex<CancellationToken>>,
    analysis: Arc<Mutex<Option<PendingAnalysis>>>,
    auth_in_flight: Arc<AtomicBool>,
}

impl AppController {
    pub fn new(
        config: AppConfig,
        repository: StateRepository,
        backend: Arc<dyn BackendClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let session_token = shutdown.child_token();
        let (updates, _) = watch::channel(AppState::default());

        Self {
            state: Arc::new(Mutex::new(AppState::default())),
            updates,
            repository,
            backend,
            notifier,
            config,
            shutdown,
            session_token: Arc::new(std::sync::Mutex::new(session_token)),
            analysis: Arc::new(Mutex::new(None)),
            auth_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// SQLite store in the data directory, mock backend, log notifications.
    pub fn open(config: AppConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("failed to create data directory {}", config.data_dir.display())
        })?;
        let database = Database::new(config.store_path())?;
        let backend = MockBackend::new(config.auth_delay, config.analysis_delay);

        Ok(Self::new(
            config,
            StateRepository::new(Arc::new(database)),
            Arc::new(backend),
            Arc::new(LogNotifier),
        ))
    }

    pub async fn snapshot(&self) -> AppState {
        self.state.lock().await.clone()
    }

    /// Receives every state produced by [`AppController::dispatch`].
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.updates.subscribe()
    }

    /// Applies `action`, mirrors the persisted slice if it changed, and
    /// publishes the new state. Storage failures are logged, never returned.
    pub async fn dispatch(&self, action: Action) -> AppState {
        let mut guard = self.state.lock().await;
        let action_name = action.name();
        let next = reduce(&guard, action);
        let persist = guard.persisted_differs(&next);
        *guard = next.clone();

        log_debug!("{action_name} -> {}", next.view.name());

        if persist {
            if let Err(err) = self.repository.save(&next.persisted()).await {
                log_error!("Failed to persist app state after {action_name}: {err:#}");
            }
        }

        self.updates.send_replace(next.clone());
        next
    }

    /// Restores persisted state and resolves the first real view.
    pub async fn boot(&self) -> View {
        if !self.config.boot_delay.is_zero() {
            tokio::select! {
                _ = self.shutdown.cancelled() => return self.snapshot().await.view,
                _ = tokio::time::sleep(self.config.boot_delay) => {}
            }
        }

        let view = match self.repository.load().await {
            Ok(Some(persisted)) => {
                let view = persisted.resume_view();
                log_info!(
                    "Restored state ({} analyses, signed in: {})",
                    persisted.analysis_history.len(),
                    persisted.user.is_some()
                );
                self.dispatch(Action::LoadPersistedState(persisted)).await;
                view
            }
            Ok(None) => {
                log_info!("No saved state; starting onboarding");
                View::Onboarding
            }
            Err(err) => {
                log_error!("Failed to load persisted state: {err:#}");
                View::Onboarding
            }
        };

        self.dispatch(Action::SetView(view)).await.view
    }

    pub async fn set_view(&self, view: View) -> AppState {
        if !view.is_results() {
            self.cancel_pending_analysis().await;
        }
        self.dispatch(Action::SetView(view)).await
    }

    pub async fn complete_onboarding(&self) -> AppState {
        self.dispatch(Action::SetFirstTime(false)).await;
        self.dispatch(Action::SetView(View::Login)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let _attempt = self.begin_auth()?;
        self.dispatch(Action::SetAuthLoading(true)).await;
        self.dispatch(Action::SetAuthError(None)).await;

        if let Err(err) = validation::validate_login(email, password) {
            return self.fail_auth(err).await;
        }

        let token = self.session_token();
        let outcome = tokio::select! {
            _ = token.cancelled() => Err(AuthError::Cancelled),
            result = self.backend.authenticate(email, password) => result,
        };

        match outcome {
            Ok(session) => {
                self.finish_auth(session.clone()).await;
                self.notifier
                    .notify(Notification::success("Welcome back! Successfully signed in."));
                Ok(session)
            }
            Err(err) => self.fail_auth(err).await,
        }
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Session, AuthError> {
        let _attempt = self.begin_auth()?;
        self.dispatch(Action::SetAuthLoading(true)).await;
        self.dispatch(Action::SetAuthError(None)).await;

        if let Err(err) = validation::validate_signup(email, password, name) {
            return self.fail_auth(err).await;
        }

        let token = self.session_token();
        let outcome = tokio::select! {
            _ = token.cancelled() => Err(AuthError::Cancelled),
            result = self.backend.register(email, password, name) => result,
        };

        match outcome {
            Ok(session) => {
                self.finish_auth(session.clone()).await;
                self.notifier.notify(Notification::success(
                    "Welcome to UriSNAP! Your account has been created successfully.",
                ));
                Ok(session)
            }
            Err(err) => self.fail_auth(err).await,
        }
    }

    pub async fn logout(&self) -> AppState {
        self.cancel_pending_analysis().await;
        self.renew_session_token();
        let state = self.dispatch(Action::ClearSessionData).await;
        self.notifier
            .notify(Notification::success("Signed out successfully. See you next time!"));
        state
    }

    /// Shows the results screen right away and analyzes in the background.
    pub async fn capture_image(&self, data: impl Into<String>) -> Result<AppState, AnalysisError> {
        let image = CapturedImage::new(data).ok_or(AnalysisError::NoCapture)?;
        if self.state.lock().await.session.is_none() {
            return Err(AnalysisError::NotSignedIn);
        }

        self.cancel_pending_analysis().await;
        self.dispatch(Action::SetCapturedImage(Some(image.clone()))).await;
        let state = self.dispatch(Action::SetView(View::results())).await;
        self.notifier
            .notify(Notification::success("Sample captured! Analyzing your results..."));

        self.spawn_analysis(image).await;
        Ok(state)
    }

    /// Turns `results` into a history record stamped with the current local
    /// date and time and the image currently on screen.
    pub async fn add_analysis(&self, results: AnalysisResults) -> AnalysisRecord {
        let now = Local::now();
        let image = self.state.lock().await.captured_image.clone();
        let record = AnalysisRecord::from_results(
            Uuid::new_v4().to_string(),
            now.date_naive(),
            now.format("%H:%M").to_string(),
            image,
            results,
        );

        self.dispatch(Action::AddAnalysis(record.clone())).await;
        record
    }

    pub async fn clear_captured_image(&self) -> AppState {
        self.cancel_pending_analysis().await;
        self.dispatch(Action::SetCapturedImage(None)).await
    }

    pub async fn new_analysis(&self) -> AppState {
        self.cancel_pending_analysis().await;
        self.dispatch(Action::SetView(View::Camera)).await;
        self.dispatch(Action::SetCapturedImage(None)).await
    }

    pub async fn back_to_dashboard(&self) -> AppState {
        self.cancel_pending_analysis().await;
        self.dispatch(Action::SetView(View::Dashboard)).await;
        self.dispatch(Action::SetCapturedImage(None)).await
    }

    pub async fn update_settings(&self, patch: SettingsPatch) -> AppState {
        let state = self.dispatch(Action::UpdateSettings(patch)).await;
        self.notifier
            .notify(Notification::success("Settings updated successfully"));
        state
    }

    /// Writes the user's profile and history as pretty JSON into the data
    /// directory and returns the file path.
    pub async fn export_data(&self) -> Result<PathBuf> {
        let (file_name, contents) = {
            let state = self.state.lock().await;
            let bundle = ExportBundle::new(
                state.session.as_ref(),
                &state.analysis_history,
                Utc::now(),
            );
            let contents = serde_json::to_string_pretty(&bundle)
                .context("failed to serialize export bundle")?;
            (bundle.file_name(), contents)
        };

        tokio::fs::create_dir_all(&self.config.data_dir)
            .await
            .with_context(|| {
                format!("failed to create {}", self.config.data_dir.display())
            })?;
        let path = self.config.data_dir.join(file_name);
        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("failed to write export to {}", path.display()))?;

        log_info!("Exported health data to {}", path.display());
        self.notifier
            .notify(Notification::success("Health data exported successfully!"));
        Ok(path)
    }

    pub async fn theme(&self) -> Result<ThemePreference> {
        self.repository.theme().await
    }

    pub async fn set_theme(&self, theme: ThemePreference) -> Result<()> {
        self.repository.set_theme(theme).await
    }

    /// Waits for the background analysis started by the last capture, if any.
    pub async fn wait_for_analysis(&self) {
        let pending = self.analysis.lock().await.take();
        if let Some(pending) = pending {
            if let Err(err) = pending.handle.await {
                if !err.is_cancelled() {
                    log_error!("Analysis task failed: {err}");
                }
            }
        }
    }

    /// Cancels every pending effect. Nothing dispatches afterwards on their
    /// behalf.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.cancel_pending_analysis().await;
    }

    fn begin_auth(&self) -> Result<AuthAttempt, AuthError> {
        self.auth_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AuthError::AlreadyInFlight)?;
        Ok(AuthAttempt {
            flag: self.auth_in_flight.clone(),
        })
    }

    async fn finish_auth(&self, session: Session) {
        log_info!("Signed in as {}", session.email);
        self.dispatch(Action::SetSession(Some(session))).await;
        self.dispatch(Action::SetView(View::Dashboard)).await;
        self.dispatch(Action::SetAuthLoading(false)).await;
    }

    async fn fail_auth(&self, err: AuthError) -> Result<Session, AuthError> {
        if let Some(message) = err.form_message() {
            self.dispatch(Action::SetAuthError(Some(message))).await;
        }
        self.dispatch(Action::SetAuthLoading(false)).await;
        Err(err)
    }

    fn session_token(&self) -> CancellationToken {
        match self.session_token.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn renew_session_token(&self) {
        let mut guard = match self.session_token.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.cancel();
        *guard = self.shutdown.child_token();
    }

    async fn spawn_analysis(&self, image: CapturedImage) {
        let token = self.session_token().child_token();
        let controller = self.clone();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = task_token.cancelled() => {
                    log_debug!("Analysis cancelled before completion");
                    return;
                }
                result = controller.backend.submit_sample(&image) => result,
            };

            if task_token.is_cancelled() {
                return;
            }

            match outcome {
                Ok(results) => {
                    let record = controller.add_analysis(results).await;
                    log_info!(
                        "Analysis {} complete: score {} ({})",
                        record.id,
                        record.health_score,
                        record.status.as_str()
                    );
                }
                Err(err) => {
                    log::warn!("Analysis failed: {err}");
                    controller
                        .dispatch(Action::AnalysisFailed(err.to_string()))
                        .await;
                    controller
                        .notifier
                        .notify(Notification::error(err.to_string()));
                }
            }
        });

        *self.analysis.lock().await = Some(PendingAnalysis { token, handle });
    }

    async fn cancel_pending_analysis(&self) {
        if let Some(pending) = self.analysis.lock().await.take() {
            if !pending.handle.is_finished() {
                log_debug!("Cancelling pending analysis");
            }
            pending.token.cancel();
        }
    }
}
