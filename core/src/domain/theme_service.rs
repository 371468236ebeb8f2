//! Theme preference persistence.

use anyhow::Result;
use log::warn;
use shared::ThemeMode;
use std::sync::Arc;

use crate::storage::KeyValueStore;

const THEME_KEY: &str = "preferences.theme";

/// Service owning the theme preference.
///
/// Loads and persists the mode through the local key-value store; anything
/// unreadable falls back to the default so a corrupt preference can never
/// block startup.
#[derive(Clone)]
pub struct ThemeService {
    storage: Arc<dyn KeyValueStore>,
}

impl ThemeService {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Load the persisted theme, defaulting to light
    pub async fn load_theme(&self) -> ThemeMode {
        match self.storage.get(THEME_KEY).await {
            Ok(Some(value)) => ThemeMode::from_storage(&value).unwrap_or_else(|| {
                warn!("unrecognized theme value {:?}, using default", value);
                ThemeMode::default()
            }),
            Ok(None) => ThemeMode::default(),
            Err(err) => {
                warn!("failed to load theme preference: {:#}", err);
                ThemeMode::default()
            }
        }
    }

    /// Persist a theme choice
    pub async fn set_theme(&self, mode: ThemeMode) -> Result<()> {
        self.storage.set(THEME_KEY, mode.as_str()).await
    }

    /// Flip between light and dark, persisting and returning the new mode
    pub async fn toggle_theme(&self) -> Result<ThemeMode> {
        let next = self.load_theme().await.toggled();
        self.set_theme(next).await?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;

    fn service() -> (ThemeService, Arc<MemoryKeyValueStore>) {
        let storage = Arc::new(MemoryKeyValueStore::new());
        (ThemeService::new(storage.clone()), storage)
    }

    #[tokio::test]
    async fn defaults_to_light_when_nothing_is_stored() {
        let (service, _) = service();
        assert_eq!(service.load_theme().await, ThemeMode::Light);
    }

    #[tokio::test]
    async fn persisted_theme_survives_a_reload() {
        let (service, storage) = service();
        service.set_theme(ThemeMode::Dark).await.unwrap();

        let reloaded = ThemeService::new(storage);
        assert_eq!(reloaded.load_theme().await, ThemeMode::Dark);
    }

    #[tokio::test]
    async fn toggle_flips_and_persists() {
        let (service, _) = service();
        assert_eq!(service.toggle_theme().await.unwrap(), ThemeMode::Dark);
        assert_eq!(service.toggle_theme().await.unwrap(), ThemeMode::Light);
        assert_eq!(service.load_theme().await, ThemeMode::Light);
    }

    #[tokio::test]
    async fn garbage_preference_falls_back_to_default() {
        let (service, storage) = service();
        storage.set(THEME_KEY, "solarized").await.unwrap();
        assert_eq!(service.load_theme().await, ThemeMode::Light);
    }
}
