use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::AppController;
use crate::{
    backend::{BackendClient, MockBackend},
    config::AppConfig,
    error::{AnalysisError, AuthError},
    models::{
        AnalysisResults, AnalysisStatus, CapturedImage, ExportFormat, Session, SettingsPatch,
        ThemePreference,
    },
    notify::{ChannelNotifier, Notification, NotificationLevel},
    state::{AnalysisPhase, View},
    store::{KeyValueStore, MemoryStore, StateRepository, STATE_KEY},
};

struct Harness {
    controller: AppController,
    store: MemoryStore,
    notifications: mpsc::UnboundedReceiver<Notification>,
    _data_dir: tempfile::TempDir,
}

fn harness_with(store: MemoryStore, backend: Arc<dyn BackendClient>) -> Harness {
    let data_dir = tempfile::tempdir().unwrap();
    let (notifier, notifications) = ChannelNotifier::new();
    let controller = AppController::new(
        AppConfig::immediate().with_data_dir(data_dir.path()),
        StateRepository::new(Arc::new(store.clone())),
        backend,
        Arc::new(notifier),
    );
    Harness {
        controller,
        store,
        notifications,
        _data_dir: data_dir,
    }
}

fn harness() -> Harness {
    harness_with(MemoryStore::new(), Arc::new(MockBackend::immediate()))
}

async fn signed_in() -> Harness {
    let h = harness();
    h.controller.boot().await;
    h.controller.complete_onboarding().await;
    h.controller.signup("a@b.com", "abcdef", "Jo").await.unwrap();
    h
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        out.push(notification);
    }
    out
}

/// Backend whose analysis always fails.
struct FailingAnalysis;

#[async_trait]
impl BackendClient for FailingAnalysis {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        MockBackend::immediate().authenticate(email, password).await
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Session, AuthError> {
        MockBackend::immediate().register(email, password, name).await
    }

    async fn submit_sample(&self, _image: &CapturedImage) -> Result<AnalysisResults, AnalysisError> {
        Err(AnalysisError::Rejected("strip not detected".into()))
    }
}

/// Store that reads nothing and refuses every write.
struct ReadOnlyStore;

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String) -> anyhow::Result<()> {
        anyhow::bail!("storage is full")
    }

    async fn remove(&self, _key: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn fresh_install_starts_onboarding_then_login() {
    let h = harness();
    assert_eq!(h.controller.snapshot().await.view, View::Loading);

    assert_eq!(h.controller.boot().await, View::Onboarding);

    let state = h.controller.complete_onboarding().await;
    assert_eq!(state.view, View::Login);
    assert!(!state.is_first_time);
}

#[tokio::test]
async fn valid_login_reaches_dashboard() {
    let mut h = harness();
    h.controller.boot().await;
    h.controller.complete_onboarding().await;

    let session = h.controller.login("a@b.com", "abcdef").await.unwrap();

    let state = h.controller.snapshot().await;
    assert_eq!(state.view, View::Dashboard);
    assert_eq!(state.session.as_ref(), Some(&session));
    assert!(!state.auth_loading);
    assert!(state.auth_error.is_none());

    let notes = drain(&mut h.notifications);
    assert!(notes
        .iter()
        .any(|n| n.level == NotificationLevel::Success && n.message.starts_with("Welcome back")));
}

#[tokio::test]
async fn short_password_keeps_login_view_and_sets_error() {
    let h = harness();
    h.controller.boot().await;
    h.controller.complete_onboarding().await;

    let err = h.controller.login("a@b.com", "short").await.unwrap_err();
    assert_eq!(err, AuthError::InvalidCredentials);

    let state = h.controller.snapshot().await;
    assert_eq!(state.view, View::Login);
    assert!(!state.auth_loading);
    assert!(state.auth_error.as_deref().is_some_and(|msg| !msg.is_empty()));
    assert!(state.session.is_none());
}

#[tokio::test]
async fn empty_email_is_rejected() {
    let h = harness();
    h.controller.boot().await;
    h.controller.complete_onboarding().await;

    assert_eq!(
        h.controller.login("", "abcdefgh").await.unwrap_err(),
        AuthError::InvalidCredentials
    );
}

#[tokio::test]
async fn retry_after_error_clears_it() {
    let h = harness();
    h.controller.boot().await;
    h.controller.complete_onboarding().await;

    let _ = h.controller.login("a@b.com", "short").await;
    h.controller.login("a@b.com", "longenough").await.unwrap();
    assert!(h.controller.snapshot().await.auth_error.is_none());
}

#[tokio::test]
async fn signup_creates_empty_session() {
    let h = signed_in().await;
    let state = h.controller.snapshot().await;

    assert_eq!(state.view, View::Dashboard);
    let user = state.session.unwrap();
    assert_eq!(user.total_analyses, 0);
    assert_eq!(user.health_score, 0);
    assert_eq!(user.name, "Jo");
}

#[tokio::test]
async fn signup_rejects_short_name() {
    let h = harness();
    h.controller.boot().await;
    h.controller.complete_onboarding().await;
    h.controller.set_view(View::Signup).await;

    let err = h.controller.signup("a@b.com", "abcdef", "J").await.unwrap_err();
    assert_eq!(err, AuthError::InvalidSignup);
    let state = h.controller.snapshot().await;
    assert_eq!(state.view, View::Signup);
    assert_eq!(state.auth_error.as_deref(), Some(err.to_string().as_str()));
}

#[tokio::test]
async fn concurrent_auth_attempt_is_rejected() {
    let store = MemoryStore::new();
    let backend = Arc::new(MockBackend::new(Duration::from_millis(200), Duration::ZERO));
    let h = harness_with(store, backend);
    h.controller.boot().await;
    h.controller.complete_onboarding().await;

    let first = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.login("a@b.com", "abcdef").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = h.controller.login("a@b.com", "abcdef").await;
    assert_eq!(second.unwrap_err(), AuthError::AlreadyInFlight);

    first.await.unwrap().unwrap();
    assert_eq!(h.controller.snapshot().await.view, View::Dashboard);
}

#[tokio::test]
async fn shutdown_cancels_pending_login() {
    let backend = Arc::new(MockBackend::new(Duration::from_secs(30), Duration::ZERO));
    let h = harness_with(MemoryStore::new(), backend);
    h.controller.boot().await;
    h.controller.complete_onboarding().await;

    let pending = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.login("a@b.com", "abcdef").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    h.controller.shutdown().await;

    assert_eq!(pending.await.unwrap().unwrap_err(), AuthError::Cancelled);
    let state = h.controller.snapshot().await;
    assert_eq!(state.view, View::Login);
    assert!(state.session.is_none());
    assert!(!state.auth_loading);
    assert!(state.auth_error.is_none());
}

#[tokio::test]
async fn logout_cancels_pending_login() {
    let backend = Arc::new(MockBackend::new(Duration::from_secs(30), Duration::ZERO));
    let h = harness_with(MemoryStore::new(), backend);
    h.controller.boot().await;
    h.controller.complete_onboarding().await;

    let pending = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.login("a@b.com", "abcdef").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    h.controller.logout().await;

    assert_eq!(pending.await.unwrap().unwrap_err(), AuthError::Cancelled);
    let state = h.controller.snapshot().await;
    assert_eq!(state.view, View::Login);
    assert!(state.session.is_none());
    assert!(!state.auth_loading);
    assert!(state.auth_error.is_none());
}

#[tokio::test]
async fn failed_writes_do_not_fail_dispatch() {
    let data_dir = tempfile::tempdir().unwrap();
    let (notifier, _notifications) = ChannelNotifier::new();
    let controller = AppController::new(
        AppConfig::immediate().with_data_dir(data_dir.path()),
        StateRepository::new(Arc::new(ReadOnlyStore)),
        Arc::new(MockBackend::immediate()),
        Arc::new(notifier),
    );
    controller.boot().await;
    controller.complete_onboarding().await;

    let session = controller.signup("a@b.com", "abcdef", "Jo").await.unwrap();

    let state = controller.snapshot().await;
    assert_eq!(state.view, View::Dashboard);
    assert_eq!(state.session, Some(session));
    assert!(!state.auth_loading);
}

#[tokio::test]
async fn capture_shows_results_then_records_analysis() {
    let h = signed_in().await;
    h.controller.set_view(View::Camera).await;

    let state = h.controller.capture_image("data:image/jpeg;base64,AAA").await.unwrap();
    assert!(state.view.is_results());
    assert!(state.captured_image.is_some());

    h.controller.wait_for_analysis().await;

    let state = h.controller.snapshot().await;
    assert_eq!(state.analysis_history.len(), 1);
    let record = &state.analysis_history[0];
    assert_eq!(
        state.view,
        View::Results {
            phase: AnalysisPhase::Complete {
                record_id: record.id.clone()
            }
        }
    );
    assert_eq!(record.image_data, state.captured_image);

    let user = state.session.unwrap();
    assert_eq!(user.total_analyses, 1);
    assert_eq!(user.health_score, record.health_score);
    assert_eq!(user.last_analysis, Some(record.date));
}

#[tokio::test]
async fn capture_requires_image_and_session() {
    let h = harness();
    h.controller.boot().await;
    assert_eq!(
        h.controller.capture_image("").await.unwrap_err(),
        AnalysisError::NoCapture
    );
    assert_eq!(
        h.controller.capture_image("img").await.unwrap_err(),
        AnalysisError::NotSignedIn
    );
}

#[tokio::test]
async fn failed_analysis_surfaces_on_results_screen() {
    let h = harness_with(MemoryStore::new(), Arc::new(FailingAnalysis));
    h.controller.boot().await;
    h.controller.signup("a@b.com", "abcdef", "Jo").await.unwrap();
    let mut notifications = h.notifications;

    h.controller.capture_image("img").await.unwrap();
    h.controller.wait_for_analysis().await;

    let state = h.controller.snapshot().await;
    assert!(matches!(
        state.view,
        View::Results {
            phase: AnalysisPhase::Failed { .. }
        }
    ));
    assert!(state.analysis_history.is_empty());
    assert!(drain(&mut notifications)
        .iter()
        .any(|n| n.level == NotificationLevel::Error));
}

#[tokio::test]
async fn leaving_results_cancels_pending_analysis() {
    let backend = Arc::new(MockBackend::new(Duration::ZERO, Duration::from_secs(30)));
    let h = harness_with(MemoryStore::new(), backend);
    h.controller.boot().await;
    h.controller.signup("a@b.com", "abcdef", "Jo").await.unwrap();

    h.controller.capture_image("img").await.unwrap();
    let state = h.controller.back_to_dashboard().await;
    assert_eq!(state.view, View::Dashboard);
    assert!(state.captured_image.is_none());

    h.controller.wait_for_analysis().await;
    assert!(h.controller.snapshot().await.analysis_history.is_empty());
}

#[tokio::test]
async fn new_analysis_returns_to_camera() {
    let h = signed_in().await;
    h.controller.capture_image("img").await.unwrap();
    h.controller.wait_for_analysis().await;

    let state = h.controller.new_analysis().await;
    assert_eq!(state.view, View::Camera);
    assert!(state.captured_image.is_none());
    assert_eq!(state.analysis_history.len(), 1);
}

#[tokio::test]
async fn add_analysis_prepends_with_defaults() {
    let h = signed_in().await;
    let first = h.controller.add_analysis(AnalysisResults::default()).await;
    let second = h
        .controller
        .add_analysis(AnalysisResults {
            overall_score: Some(61),
            status: Some(AnalysisStatus::Low),
            ..Default::default()
        })
        .await;

    assert_eq!(first.health_score, 85);
    assert_eq!(first.status, AnalysisStatus::Normal);
    assert_eq!(first.time.len(), 5);

    let state = h.controller.snapshot().await;
    assert_eq!(state.analysis_history.len(), 2);
    assert_eq!(state.analysis_history[0], second);
    assert_eq!(state.session.unwrap().health_score, 61);
}

#[tokio::test]
async fn logout_clears_session_but_keeps_settings() {
    let h = signed_in().await;
    h.controller.add_analysis(AnalysisResults::default()).await;
    h.controller
        .update_settings(SettingsPatch {
            export_format: Some(ExportFormat::Csv),
            ..Default::default()
        })
        .await;

    let once = h.controller.logout().await;
    let twice = h.controller.logout().await;
    assert_eq!(once, twice);
    assert_eq!(once.view, View::Login);
    assert!(once.session.is_none());
    assert!(once.analysis_history.is_empty());
    assert_eq!(once.settings.export_format, ExportFormat::Csv);
}

#[tokio::test]
async fn state_survives_restart() {
    let h = signed_in().await;
    h.controller.add_analysis(AnalysisResults::default()).await;
    h.controller
        .update_settings(SettingsPatch {
            data_retention: Some(90),
            ..Default::default()
        })
        .await;
    let before = h.controller.snapshot().await.persisted();

    let restarted = harness_with(h.store.clone(), Arc::new(MockBackend::immediate()));
    assert_eq!(restarted.controller.boot().await, View::Dashboard);
    assert_eq!(restarted.controller.snapshot().await.persisted(), before);
}

#[tokio::test]
async fn returning_signed_out_user_resumes_at_login() {
    let h = signed_in().await;
    h.controller.logout().await;

    let restarted = harness_with(h.store.clone(), Arc::new(MockBackend::immediate()));
    assert_eq!(restarted.controller.boot().await, View::Login);
}

#[tokio::test]
async fn partial_settings_keep_saved_user() {
    let user = Session::new(
        "u1".into(),
        "Jo".into(),
        "a@b.com".into(),
        chrono::Utc::now(),
    );
    let blob = serde_json::json!({
        "user": &user,
        "isFirstTime": false,
        "analysisHistory": [],
        "settings": { "notifications": false },
    });
    let store = MemoryStore::new();
    store.set(STATE_KEY, blob.to_string()).await.unwrap();

    let h = harness_with(store, Arc::new(MockBackend::immediate()));
    assert_eq!(h.controller.boot().await, View::Dashboard);

    let state = h.controller.snapshot().await;
    assert_eq!(state.session, Some(user));
    assert!(!state.settings.notifications);
    assert_eq!(state.settings.data_retention, 365);
}

#[tokio::test]
async fn corrupt_blob_falls_back_to_onboarding() {
    let store = MemoryStore::new();
    store.set(STATE_KEY, "{\"user\": 42".into()).await.unwrap();

    let h = harness_with(store, Arc::new(MockBackend::immediate()));
    assert_eq!(h.controller.boot().await, View::Onboarding);
    assert!(h.controller.snapshot().await.session.is_none());
}

#[tokio::test]
async fn every_persisted_change_is_written() {
    let h = signed_in().await;
    let stored = h.store.get(STATE_KEY).await.unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(json["user"]["email"], "a@b.com");
    assert_eq!(json["isFirstTime"], false);
    assert!(json.get("analysisHistory").is_some());
    assert!(json.get("settings").is_some());
}

#[tokio::test]
async fn subscribers_see_dispatched_states() {
    let h = harness();
    let mut updates = h.controller.subscribe();
    h.controller.boot().await;

    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().view, View::Onboarding);
}

#[tokio::test]
async fn export_writes_bundle_to_data_dir() {
    let h = signed_in().await;
    h.controller.add_analysis(AnalysisResults::default()).await;

    let path = h.controller.export_data().await.unwrap();
    assert!(path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("urisnap-data-") && name.ends_with(".json")));

    let contents = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(json["user"]["name"], "Jo");
    assert_eq!(json["analyses"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn theme_is_stored_separately() {
    let h = harness();
    assert_eq!(h.controller.theme().await.unwrap(), ThemePreference::System);
    h.controller.set_theme(ThemePreference::Dark).await.unwrap();
    assert_eq!(h.controller.theme().await.unwrap(), ThemePreference::Dark);
    assert!(h.store.get(STATE_KEY).await.unwrap().is_none());
}
