use std::{path::PathBuf, time::Duration};

const DEFAULT_BOOT_DELAY_MS: u64 = 2_000;
const DEFAULT_AUTH_DELAY_MS: u64 = 1_500;
const DEFAULT_ANALYSIS_DELAY_MS: u64 = 3_000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Holds the SQLite store and data exports.
    pub data_dir: PathBuf,
    /// Splash-screen time before persisted state is restored.
    pub boot_delay: Duration,
    /// Simulated round trip for login and signup.
    pub auth_delay: Duration,
    /// Simulated time to analyze a captured sample.
    pub analysis_delay: Duration,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("urisnap-data"),
            boot_delay: Duration::from_millis(DEFAULT_BOOT_DELAY_MS),
            auth_delay: Duration::from_millis(DEFAULT_AUTH_DELAY_MS),
            analysis_delay: Duration::from_millis(DEFAULT_ANALYSIS_DELAY_MS),
            debug: false,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `URISNAP_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            data_dir: std::env::var_os("URISNAP_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            boot_delay: env_millis("URISNAP_BOOT_DELAY_MS").unwrap_or(defaults.boot_delay),
            auth_delay: env_millis("URISNAP_AUTH_DELAY_MS").unwrap_or(defaults.auth_delay),
            analysis_delay: env_millis("URISNAP_ANALYSIS_DELAY_MS")
                .unwrap_or(defaults.analysis_delay),
            debug: std::env::var("URISNAP_DEBUG")
                .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    /// No simulated latency anywhere.
    pub fn immediate() -> Self {
        Self {
            boot_delay: Duration::ZERO,
            auth_delay: Duration::ZERO,
            analysis_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("urisnap.sqlite3")
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(err) => {
            log::warn!("Ignoring {name}={raw}: {err}");
            None
        }
    }
}
