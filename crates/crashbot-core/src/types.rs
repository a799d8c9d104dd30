use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The platforms a crash report covers, in the order they are rendered.
pub const PLATFORMS: [Platform; 2] = [Platform::Android, Platform::Ios];

/// One of the two mobile platforms the tracked app ships on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    /// Label used in the rendered report.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Android => "Android",
            Platform::Ios => "iOS",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Start of the "since launch" reporting window.
///
/// AppCenter serves at most 90 days of history; 89 keeps a one-day margin.
pub fn launch_window_start() -> DateTime<Utc> {
    Utc::now() - Duration::days(89)
}

/// Start of the "last 24 hours" reporting window.
pub fn day_window_start() -> DateTime<Utc> {
    Utc::now() - Duration::days(1)
}
