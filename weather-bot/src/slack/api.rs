use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use weather_core::SlackConfig;

use super::blocks::Message;

/// Minimal Slack Web API client: opening Socket Mode connections and posting messages.
#[derive(Debug, Clone)]
pub struct SlackClient {
    api_url: String,
    bot_token: String,
    app_token: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl ApiResponse {
    fn into_result(self, method: &str) -> Result<Self> {
        if self.ok {
            Ok(self)
        } else {
            Err(anyhow!(
                "Slack {method} failed: {}",
                self.error.as_deref().unwrap_or("unknown_error")
            ))
        }
    }
}

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    #[serde(flatten)]
    message: &'a Message,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Self {
        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            app_token: config.app_token.clone(),
            http: Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_url)
    }

    /// Ask Slack for a fresh Socket Mode websocket URL (`apps.connections.open`).
    pub async fn open_connection(&self) -> Result<String> {
        let res: ApiResponse = self
            .http
            .post(self.method_url("apps.connections.open"))
            .bearer_auth(&self.app_token)
            .send()
            .await
            .context("Failed to send request to Slack (apps.connections.open)")?
            .json()
            .await
            .context("Failed to parse Slack apps.connections.open response")?;

        res.into_result("apps.connections.open")?
            .url
            .ok_or_else(|| anyhow!("Slack apps.connections.open returned no url"))
    }

    /// Post `message` to `channel` as the bot user (`chat.postMessage`).
    pub async fn post_message(&self, channel: &str, message: &Message) -> Result<()> {
        let res: ApiResponse = self
            .http
            .post(self.method_url("chat.postMessage"))
            .bearer_auth(&self.bot_token)
            .json(&PostMessageRequest { channel, message })
            .send()
            .await
            .context("Failed to send request to Slack (chat.postMessage)")?
            .json()
            .await
            .context("Failed to parse Slack chat.postMessage response")?;

        res.into_result("chat.postMessage")?;
        Ok(())
    }
}
