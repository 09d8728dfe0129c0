use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PROVIDER: &str = "google";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AiSettings {
    fn default() -> Self {
        AiSettings {
            provider: default_provider(),
            api_key: String::new(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn is_configured(&self) -> bool {
        !self.provider.is_empty()
            && !self.model.is_empty()
            && (self.provider == "ollama" || !self.api_key.is_empty())
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in
    /// production and a map in tests.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty("GEMINI_API_KEY") {
            self.api_key = key;
        }
        if let Some(provider) = non_empty("CUESIGHT_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = non_empty("CUESIGHT_MODEL") {
            self.model = model;
        }
        match non_empty("CUESIGHT_TIMEOUT_SECS").map(|v| v.trim().parse::<u64>()) {
            Some(Ok(secs)) => self.timeout_secs = secs,
            Some(Err(e)) => tracing::warn!("ignoring CUESIGHT_TIMEOUT_SECS: {e}"),
            None => {}
        }
        self
    }
}

/// Environment variables that override stored settings.
pub const OVERRIDE_VARS: [&str; 4] = [
    "GEMINI_API_KEY",
    "CUESIGHT_PROVIDER",
    "CUESIGHT_MODEL",
    "CUESIGHT_TIMEOUT_SECS",
];

/// Environment overrides captured once at startup. They are applied when
/// settings are read for use and never written back to the settings file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides(HashMap<String, String>);

impl Overrides {
    pub fn from_env() -> Self {
        Overrides::from_pairs(
            OVERRIDE_VARS
                .iter()
                .filter_map(|var| std::env::var(var).ok().map(|v| (var.to_string(), v))),
        )
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Overrides(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// `stored` with the captured overrides on top.
    pub fn apply(&self, stored: AiSettings) -> AiSettings {
        stored.with_overrides(|key| self.0.get(key).cloned())
    }
}

// --- Storage ---

/// Resolve the global config directory (~/.cuesight/).
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cuesight")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Stored settings only; combine with [`Overrides::apply`] before use.
pub fn read_settings() -> AiSettings {
    read_settings_from(&settings_path())
}

/// Missing or unreadable files fall back to defaults.
pub fn read_settings_from(path: &Path) -> AiSettings {
    if !path.exists() {
        return AiSettings::default();
    }
    match fs::read_to_string(path).map(|s| serde_json::from_str(&s)) {
        Ok(Ok(settings)) => settings,
        Ok(Err(e)) => {
            tracing::warn!("ignoring malformed settings at {}: {e}", path.display());
            AiSettings::default()
        }
        Err(e) => {
            tracing::warn!("cannot read settings at {}: {e}", path.display());
            AiSettings::default()
        }
    }
}

pub fn write_settings_to(path: &Path, settings: &AiSettings) -> Result<(), String> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| e.to_string())?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(|e| e.to_string())?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| e.to_string())?;
    fs::rename(&tmp, path).map_err(|e| e.to_string())
}
