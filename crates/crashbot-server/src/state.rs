use crashbot_appcenter::{AppCenterClient, CrashSource};
use crashbot_core::config::{AppCenterSettings, AppConfig};
use std::sync::Arc;

use crate::slack::SlackResponder;

/// Shared application state for the server.
#[derive(Clone)]
pub struct AppState {
    /// Present only when the bot is fully configured; `None` means every
    /// command is answered with setup instructions.
    pub backend: Option<Backend>,
    pub slack: SlackResponder,
}

/// Everything the deferred computation needs.
#[derive(Clone)]
pub struct Backend {
    pub settings: AppCenterSettings,
    pub source: Arc<dyn CrashSource>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let backend = match config.appcenter.resolve() {
            Some(settings) => {
                let client = AppCenterClient::new(&settings)?;
                Some(Backend {
                    settings,
                    source: Arc::new(client),
                })
            }
            None => None,
        };
        Ok(Self {
            backend,
            slack: SlackResponder::new(),
        })
    }
}
