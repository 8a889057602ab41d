use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ParleyError;
use crate::i18n::Locale;
use crate::provider::{GeminiProvider, FALLBACK_REPLY};
use crate::session::SessionOptions;
use crate::storage::{JsonFileStore, DEFAULT_STORAGE_KEY};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Overrides the platform data directory.
    pub dir: Option<PathBuf>,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub model: String,
    pub api_key_env: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Drop a late reply if the conversation was cleared or archived while
    /// it was pending, instead of appending it to the new conversation.
    pub discard_stale_responses: bool,
    pub fallback_reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub locale: Locale,
    pub reveal_chunk_chars: usize,
    pub reveal_delay_ms: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dir: None,
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: None,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            discard_stale_responses: false,
            fallback_reply: FALLBACK_REPLY.to_string(),
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            locale: Locale::En,
            reveal_chunk_chars: 3,
            reveal_delay_ms: 15,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("parley")
            .join("config.toml")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Read settings from `path`, falling back to defaults when the file is
    /// missing or does not parse.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Ignoring invalid config {}: {}", path.display(), e),
                },
                Err(e) => tracing::warn!("Failed to read config {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    pub fn save(&self) -> Result<(), ParleyError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ParleyError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ParleyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Directory holding the chat state record.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage.dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("parley")
        })
    }

    pub fn build_store(&self) -> JsonFileStore {
        JsonFileStore::new(self.storage_dir(), &self.storage.key)
    }

    /// Get the API key from the environment variable specified in settings.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.provider.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }

    pub fn build_provider(&self) -> Result<GeminiProvider, ParleyError> {
        let api_key = self.api_key().ok_or_else(|| {
            ParleyError::Config(format!(
                "No API key found; set the {} environment variable",
                self.provider.api_key_env
            ))
        })?;

        let mut provider = GeminiProvider::new(api_key).with_model(&self.provider.model);
        if let Some(ref url) = self.provider.base_url {
            provider = provider.with_base_url(url);
        }
        Ok(provider)
    }

    pub fn session_options(&self) -> SessionOptions {
        let fallback_reply = if self.session.fallback_reply.trim().is_empty() {
            tracing::warn!("Blank session.fallback_reply in config, using the default");
            FALLBACK_REPLY.to_string()
        } else {
            self.session.fallback_reply.clone()
        };
        SessionOptions {
            discard_stale_responses: self.session.discard_stale_responses,
            fallback_reply,
            locale: self.ui.locale,
        }
    }
}
