use crashbot_analytics::crash_report;
use crashbot_core::error::{BotError, Result};
use crashbot_core::types::Platform;

use crate::slack::SlackResponder;
use crate::state::Backend;

/// A validated slash command: a version, with build ids either supplied by
/// the caller or left for lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashCommand {
    pub version: String,
    pub android_build: Option<String>,
    pub ios_build: Option<String>,
}

impl CrashCommand {
    /// Parse raw slash-command text. Valid shapes are exactly one token
    /// (version) or exactly three (version, Android build, iOS build).
    pub fn parse(text: Option<&str>) -> Result<Self> {
        let text = text.map(str::trim).unwrap_or("");
        if text.is_empty() {
            return Err(BotError::InvalidCommand(
                "Expected command parameters, but got none.".into(),
            ));
        }
        let tokens: Vec<&str> = text.split_whitespace().collect();
        match tokens.as_slice() {
            [version] => Ok(Self {
                version: (*version).to_string(),
                android_build: None,
                ios_build: None,
            }),
            [version, droid, ios] => Ok(Self {
                version: (*version).to_string(),
                android_build: Some((*droid).to_string()),
                ios_build: Some((*ios).to_string()),
            }),
            _ => Err(BotError::InvalidCommand(format!(
                "Invalid command parameters: \"{text}\". Expected either \"version\" \
                 (e.g. \"3.2.0\"), or \"version droid-build ios-build\" \
                 (e.g. \"3.2.0 387 3.2.0.23.0\")."
            ))),
        }
    }
}

/// The deferred half of an acknowledged command: resolve builds, aggregate,
/// and make exactly one delivery attempt to the callback URL.
pub async fn run_deferred(
    backend: Backend,
    slack: SlackResponder,
    command: CrashCommand,
    response_url: String,
) {
    let text = build_report(&backend, &command).await;
    slack.deliver(&response_url, &text).await;
}

/// Compute the report text; every failure becomes a user-facing message so
/// the channel always hears back.
async fn build_report(backend: &Backend, command: &CrashCommand) -> String {
    let (android_build, ios_build) = match resolve_builds(backend, command).await {
        Ok(Some(builds)) => builds,
        Ok(None) => {
            return format!(
                "Could not determine latest builds for version {}. \
                 Try again, or specify them explicitly.",
                command.version
            );
        }
        Err(err) => return format!("I crashed due to: {err}"),
    };

    match crash_report(
        backend.source.as_ref(),
        &backend.settings,
        &command.version,
        &android_build,
        &ios_build,
    )
    .await
    {
        Ok(report) => report,
        Err(err) => format!("I crashed due to: {err}"),
    }
}

/// Fill in build ids the caller left out by asking the data source for the
/// newest build of the version. `None` when either platform has no known
/// builds.
async fn resolve_builds(
    backend: &Backend,
    command: &CrashCommand,
) -> Result<Option<(String, String)>> {
    let android = match &command.android_build {
        Some(build) => Some(build.clone()),
        None => {
            backend
                .source
                .latest_build(backend.settings.app(Platform::Android), &command.version)
                .await?
        }
    };
    let ios = match &command.ios_build {
        Some(build) => Some(build.clone()),
        None => {
            backend
                .source
                .latest_build(backend.settings.app(Platform::Ios), &command.version)
                .await?
        }
    };
    Ok(android.zip(ios))
}
