use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::Platform;

/// Top-level application configuration, loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub appcenter: AppCenterConfig,
}

impl AppConfig {
    /// Load configuration from the default path (~/.config/crashbot/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Write current configuration to the default path.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("crashbot")
            .join("config.toml")
    }

    /// Apply environment-variable overrides on top of the file values, so
    /// the bot can be configured entirely from the host environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    fn apply_env_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(owner) = get("APPCENTER_OWNER") {
            self.appcenter.owner = Some(owner);
        }
        if let Some(token) = get("APPCENTER_API_TOKEN") {
            self.appcenter.api_token = Some(token);
        }
        if let Some(app) = get("CRASHBOT_ANDROID_APP") {
            self.appcenter.android_app = Some(app);
        }
        if let Some(app) = get("CRASHBOT_IOS_APP") {
            self.appcenter.ios_app = Some(app);
        }
        if let Some(port) = get("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

/// AppCenter connection settings.
///
/// The four `Option` fields are all required before the bot can serve a
/// command; `resolve` turns them into [`AppCenterSettings`] or reports the
/// "not set up" state as `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppCenterConfig {
    /// Base URL of the AppCenter REST API.
    pub api_base: String,
    /// Base URL of the AppCenter web portal (dashboard links, pagination).
    pub portal_base: String,
    /// Owner (user or organization) slug the apps live under.
    pub owner: Option<String>,
    /// API token sent with every request.
    pub api_token: Option<String>,
    /// Android app slug.
    pub android_app: Option<String>,
    /// iOS app slug.
    pub ios_app: Option<String>,
}

impl Default for AppCenterConfig {
    fn default() -> Self {
        Self {
            api_base: "https://appcenter.ms/api/v0.1".into(),
            portal_base: "https://appcenter.ms".into(),
            owner: None,
            api_token: None,
            android_app: None,
            ios_app: None,
        }
    }
}

impl AppCenterConfig {
    /// All required values present, or `None` when the bot is not set up.
    pub fn resolve(&self) -> Option<AppCenterSettings> {
        Some(AppCenterSettings {
            api_base: self.api_base.clone(),
            portal_base: self.portal_base.clone(),
            owner: self.owner.clone()?,
            api_token: self.api_token.clone()?,
            android_app: self.android_app.clone()?,
            ios_app: self.ios_app.clone()?,
        })
    }
}

/// Fully-resolved AppCenter settings; constructing one proves the bot is
/// set up.
#[derive(Debug, Clone)]
pub struct AppCenterSettings {
    pub api_base: String,
    pub portal_base: String,
    pub owner: String,
    pub api_token: String,
    pub android_app: String,
    pub ios_app: String,
}

impl AppCenterSettings {
    /// App slug for a platform.
    pub fn app(&self, platform: Platform) -> &str {
        match platform {
            Platform::Android => &self.android_app,
            Platform::Ios => &self.ios_app,
        }
    }
}
