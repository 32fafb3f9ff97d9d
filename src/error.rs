use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password. Password must be at least 6 characters.")]
    InvalidCredentials,
    #[error("Please check all fields. Password must be at least 6 characters.")]
    InvalidSignup,
    #[error("an authentication request is already in progress")]
    AlreadyInFlight,
    #[error("authentication was cancelled")]
    Cancelled,
}

impl AuthError {
    /// Message shown on the login/signup form, if this error belongs there.
    pub fn form_message(&self) -> Option<String> {
        match self {
            AuthError::AlreadyInFlight | AuthError::Cancelled => None,
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("no captured image to analyze")]
    NoCapture,
    #[error("sign in before capturing a sample")]
    NotSignedIn,
    #[error("sample could not be analyzed: {0}")]
    Rejected(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("{intent} is not available on the {view} screen")]
    Unavailable {
        intent: &'static str,
        view: &'static str,
    },
}
