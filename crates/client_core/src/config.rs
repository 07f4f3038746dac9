use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "users.toml";

#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "https://gorest.co.in/public-api".into(),
            api_token: None,
            request_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    api_token: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Loads settings from defaults, then `users.toml` (or `path`), then the process
/// environment.
///
/// A missing default file is ignored; a missing explicit file is an error.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (file_path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };
    if required || file_path.exists() {
        apply_file(&mut settings, &file_path)?;
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    finalize(settings)
}

fn apply_file(settings: &mut Settings, path: &Path) -> anyhow::Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    let file_cfg: FileSettings = toml::from_str(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;

    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.api_token {
        settings.api_token = Some(v);
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    Ok(())
}

pub(crate) fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("API_KEY") {
        settings.api_token = Some(v);
    }
    if let Some(v) = lookup("APP__API_TOKEN") {
        settings.api_token = Some(v);
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

/// Normalizes and checks settings after all layers have been applied.
pub fn finalize(mut settings: Settings) -> anyhow::Result<Settings> {
    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    settings.api_token = settings
        .api_token
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    if settings.request_timeout_secs == 0 {
        bail!("request_timeout_secs must be greater than zero");
    }
    Ok(settings)
}

fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    let parsed =
        Url::parse(raw).with_context(|| format!("invalid api base url '{raw}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("api base url '{raw}' must use http or https");
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
