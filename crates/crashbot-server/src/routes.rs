use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Form;
use axum::Router;

use crate::command::{run_deferred, CrashCommand};
use crate::slack::{CommandReply, SlashCommandForm};
use crate::state::AppState;

/// Synchronous reply when required AppCenter settings are missing.
const SETUP_MESSAGE: &str = "CrashBot is not properly set up. Make sure that the AppCenter \
     owner, API token, and both app names are present in the config file or environment \
     (APPCENTER_OWNER, APPCENTER_API_TOKEN, CRASHBOT_ANDROID_APP, CRASHBOT_IOS_APP).";

// ── Health ──────────────────────────────────────────────────────────────

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ── Slash command ───────────────────────────────────────────────────────

pub fn slack_routes() -> Router<AppState> {
    Router::new().route("/slack", post(slash_command))
}

/// Entry point for the Slack slash command.
///
/// Setup and validation failures are answered synchronously. A valid
/// command is acknowledged immediately (Slack gives the first response a
/// ~3 second deadline) and the real work runs on a spawned task that
/// delivers to the callback URL.
async fn slash_command(
    State(state): State<AppState>,
    Form(form): Form<SlashCommandForm>,
) -> Response {
    let Some(backend) = state.backend.clone() else {
        return SETUP_MESSAGE.into_response();
    };
    let Some(response_url) = form.response_url.filter(|url| !url.is_empty()) else {
        return "No callback URL".into_response();
    };
    let command = match CrashCommand::parse(form.text.as_deref()) {
        Ok(command) => command,
        Err(err) => return err.to_string().into_response(),
    };

    tracing::info!(version = %command.version, "Accepted crash-report command");
    tokio::spawn(run_deferred(backend, state.slack.clone(), command, response_url));

    Json(CommandReply::in_channel("Fetching data...")).into_response()
}
