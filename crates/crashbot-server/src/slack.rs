use serde::{Deserialize, Serialize};

/// The slice of Slack's slash-command form payload the bot uses. All other
/// form fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlashCommandForm {
    /// Free text after the command name.
    #[serde(default)]
    pub text: Option<String>,
    /// Callback URL for the deferred result.
    #[serde(default)]
    pub response_url: Option<String>,
}

/// Whether a reply is visible to the whole channel or only the invoker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Ephemeral,
    InChannel,
}

/// Body for both the immediate acknowledgement and the deferred result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandReply {
    pub response_type: ResponseType,
    pub text: String,
}

impl CommandReply {
    /// An in-channel reply, the only kind this bot sends.
    pub fn in_channel(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::InChannel,
            text: text.into(),
        }
    }
}

/// Posts deferred replies to the callback URL Slack supplied with the
/// original command.
#[derive(Clone)]
pub struct SlackResponder {
    http: reqwest::Client,
}

impl Default for SlackResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl SlackResponder {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("crashbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { http }
    }

    /// Fire-and-forget delivery. A failed POST is logged and dropped; the
    /// callback URL is the only remaining channel back to the user.
    pub async fn deliver(&self, response_url: &str, text: &str) {
        let reply = CommandReply::in_channel(text);
        match self.http.post(response_url).json(&reply).send().await {
            Ok(resp) if !resp.status().is_success() => {
                tracing::error!(
                    "Slack callback returned {} for {}",
                    resp.status(),
                    response_url
                );
            }
            Ok(_) => {
                tracing::debug!("Delivered deferred reply to {}", response_url);
            }
            Err(err) => {
                tracing::error!("Failed to deliver deferred reply: {}", err);
            }
        }
    }
}
