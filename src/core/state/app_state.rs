use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::curseforge::{CurseForgeClient, CURSEFORGE_API};
use crate::core::error::{ResolverError, ResolverResult};
use crate::core::http::APP_USER_AGENT;

const APP_DIR_NAME: &str = "cfmeta";
const SETTINGS_FILE: &str = "settings.json";

pub const API_KEY_ENV: &str = "CFMETA_API_KEY";
pub const API_URL_ENV: &str = "CFMETA_API_URL";

/// User settings persisted as `settings.json` in the config directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: CURSEFORGE_API.to_string(),
            api_key: None,
            user_agent: APP_USER_AGENT.to_string(),
        }
    }
}

impl Settings {
    /// Apply `CFMETA_*` overrides from an environment lookup.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.is_empty()) {
            self.api_base_url = url;
        }
        self
    }
}

pub struct AppState {
    pub config_dir: PathBuf,
    pub settings: Settings,
}

impl AppState {
    /// Load settings from the default config directory plus the process environment.
    pub fn load() -> Self {
        Self::load_from(default_config_dir())
    }

    pub fn load_from(config_dir: PathBuf) -> Self {
        let settings = load_settings_from_disk(&config_dir)
            .unwrap_or_default()
            .with_env_overrides(|name| std::env::var(name).ok());

        Self {
            config_dir,
            settings,
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    pub fn save_settings(&self) -> ResolverResult<()> {
        std::fs::create_dir_all(&self.config_dir).map_err(|e| ResolverError::Io {
            path: self.config_dir.clone(),
            source: e,
        })?;

        let path = self.settings_path();
        let json = serde_json::to_string_pretty(&self.settings)?;
        std::fs::write(&path, json).map_err(|e| ResolverError::Io { path, source: e })
    }

    /// CurseForge client for the configured host and credentials.
    pub fn api_client(&self) -> ResolverResult<CurseForgeClient> {
        CurseForgeClient::from_credentials(
            &self.settings.api_base_url,
            &self.settings.user_agent,
            self.settings.api_key.as_deref(),
        )
    }
}

fn load_settings_from_disk(config_dir: &Path) -> Option<Settings> {
    let path = config_dir.join(SETTINGS_FILE);
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!("Ignoring corrupt settings at {:?}: {}", path, e);
            None
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
