//! Stand-in for the remote service behind sign-in and sample analysis.
//!
//! [`MockBackend`] fabricates sessions and results after a configurable delay;
//! a networked client can implement [`BackendClient`] without touching the
//! reducer or the router.

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::{
    error::{AnalysisError, AuthError},
    models::{AnalysisResults, AnalysisStatus, CapturedImage, ParameterReading, Session},
};

#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn register(&self, email: &str, password: &str, name: &str)
        -> Result<Session, AuthError>;

    async fn submit_sample(&self, image: &CapturedImage) -> Result<AnalysisResults, AnalysisError>;
}

/// Client-side credential checks applied before any backend call.
pub mod validation {
    use crate::error::AuthError;

    const MIN_PASSWORD_CHARS: usize = 6;
    const MIN_NAME_CHARS: usize = 2;

    pub fn validate_login(email: &str, password: &str) -> Result<(), AuthError> {
        if email.trim().is_empty() || password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(())
    }

    pub fn validate_signup(email: &str, password: &str, name: &str) -> Result<(), AuthError> {
        if email.trim().is_empty()
            || password.chars().count() < MIN_PASSWORD_CHARS
            || name.trim().chars().count() < MIN_NAME_CHARS
        {
            return Err(AuthError::InvalidSignup);
        }
        Ok(())
    }
}

pub struct MockBackend {
    auth_delay: Duration,
    analysis_delay: Duration,
}

impl MockBackend {
    pub fn new(auth_delay: Duration, analysis_delay: Duration) -> Self {
        Self {
            auth_delay,
            analysis_delay,
        }
    }

    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

/// "jo.doe@b.com" -> "Jo.doe"
fn display_name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let mut chars = local.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn returning_session(email: &str) -> Session {
    let mut rng = rand::thread_rng();
    let mut session = Session::new(
        Uuid::new_v4().to_string(),
        display_name_from_email(email),
        email.to_string(),
        Utc::now(),
    );
    session.total_analyses = rng.gen_range(0..10);
    session.health_score = rng.gen_range(85..100);
    session
}

fn mock_results() -> AnalysisResults {
    let mut rng = rand::thread_rng();
    let status = if rng.gen_bool(0.2) {
        AnalysisStatus::Elevated
    } else {
        AnalysisStatus::Normal
    };

    let parameters = [
        ("glucose", "Negative"),
        ("protein", "Trace"),
        ("ketones", "Negative"),
        ("blood", "Negative"),
        ("pH", "6.5"),
        ("specificGravity", "1.020"),
    ]
    .into_iter()
    .map(|(key, value)| {
        (
            key.to_string(),
            ParameterReading::new(value, AnalysisStatus::Normal),
        )
    })
    .collect::<BTreeMap<_, _>>();

    AnalysisResults {
        overall_score: Some(rng.gen_range(85..100)),
        status: Some(status),
        parameters,
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        tokio::time::sleep(self.auth_delay).await;
        validation::validate_login(email, password)?;
        Ok(returning_session(email))
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Session, AuthError> {
        tokio::time::sleep(self.auth_delay).await;
        validation::validate_signup(email, password, name)?;
        Ok(Session::new(
            Uuid::new_v4().to_string(),
            name.trim().to_string(),
            email.to_string(),
            Utc::now(),
        ))
    }

    async fn submit_sample(&self, image: &CapturedImage) -> Result<AnalysisResults, AnalysisError> {
        log::debug!("Analyzing sample ({} bytes of image data)", image.as_str().len());
        tokio::time::sleep(self.analysis_delay).await;
        Ok(mock_results())
    }
}
