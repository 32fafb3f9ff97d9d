//! On-device persistence.
//!
//! The application state is mirrored as a single JSON blob under
//! [`STATE_KEY`]; every write replaces the previous blob. The theme choice is
//! stored separately under [`THEME_KEY`].

use std::{collections::HashMap, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::{models::ThemePreference, state::PersistedState};

mod database;
mod migrations;

pub use database::Database;

pub const STATE_KEY: &str = "urisnap-app-state";
pub const THEME_KEY: &str = "urisnap-theme";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store, used when no device storage is available and in tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<std::sync::Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Typed access to the blobs the app keeps in a [`KeyValueStore`].
#[derive(Clone)]
pub struct StateRepository {
    store: Arc<dyn KeyValueStore>,
}

impl StateRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// `Ok(None)` when nothing has been saved yet; `Err` when the blob is
    /// unreadable or does not parse.
    pub async fn load(&self) -> Result<Option<PersistedState>> {
        let Some(raw) = self.store.get(STATE_KEY).await? else {
            return Ok(None);
        };
        let persisted = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse persisted state under {STATE_KEY}"))?;
        Ok(Some(persisted))
    }

    pub async fn save(&self, persisted: &PersistedState) -> Result<()> {
        let serialized =
            serde_json::to_string(persisted).context("failed to serialize app state")?;
        self.store.set(STATE_KEY, serialized).await
    }

    /// Unknown or missing values read as the system theme.
    pub async fn theme(&self) -> Result<ThemePreference> {
        let raw = self.store.get(THEME_KEY).await?;
        Ok(raw
            .as_deref()
            .and_then(ThemePreference::parse)
            .unwrap_or_default())
    }

    pub async fn set_theme(&self, theme: ThemePreference) -> Result<()> {
        self.store.set(THEME_KEY, theme.as_str().to_string()).await
    }
}
