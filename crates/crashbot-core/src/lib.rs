pub mod config;
pub mod error;
pub mod types;

pub use config::{AppCenterConfig, AppCenterSettings, AppConfig, ServerConfig};
pub use error::{BotError, Result};
pub use types::Platform;
