//! Channel messaging collaborator
//!
//! Abstracts the messaging platform so the lifecycle logic can be tested
//! without network access.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, instrument};

use crate::error::CoreError;

/// Channel messenger trait
///
/// Covers the three capabilities the subscription lifecycle needs: direct
/// messages, single-use invite links, and removing a member from the
/// channel.
#[async_trait]
pub trait ChannelMessenger: Send + Sync {
    /// Send a direct message to a user
    async fn send_message(&self, user_id: i64, text: &str) -> Result<(), CoreError>;

    /// Create a single-use, one-member invite link to the private channel.
    ///
    /// `name` labels the link for audit (the invoice id of the payment that
    /// earned it).
    async fn create_invite_link(&self, name: &str) -> Result<String, CoreError>;

    /// Remove a user from the channel: ban then immediately unban, so the
    /// user is kicked but may re-join with a fresh invite after paying
    /// again.
    async fn kick_member(&self, user_id: i64) -> Result<(), CoreError>;
}

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API messenger
#[derive(Clone)]
pub struct TelegramMessenger {
    client: Client,
    api_base: String,
    token: String,
    channel_id: i64,
}

impl TelegramMessenger {
    /// Create a new Telegram messenger for a bot token and channel
    pub fn new(token: impl Into<String>, channel_id: i64) -> Self {
        Self {
            client: Client::new(),
            api_base: TELEGRAM_API_BASE.to_string(),
            token: token.into(),
            channel_id,
        }
    }

    /// Override the API base URL (for tests against a mock server)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Call a Bot API method and unwrap the response envelope
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, CoreError> {
        let url = format!("{}/bot{}/{}", self.api_base, self.token, method);

        let response = self.client.post(&url).json(body).send().await.map_err(|e| {
            error!(method = %method, error = %e, "Bot API request failed");
            CoreError::Messenger(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(method = %method, status = %status, body = %error_body, "Bot API error");
            return Err(CoreError::Messenger(format!("Bot API error: {status}")));
        }

        let envelope: ApiEnvelope<T> = response.json().await.map_err(|e| {
            error!(method = %method, error = %e, "Failed to parse Bot API response");
            CoreError::Internal(e.to_string())
        })?;

        if !envelope.ok {
            let description = envelope.description.unwrap_or_default();
            error!(method = %method, description = %description, "Bot API rejected the call");
            return Err(CoreError::Messenger(description));
        }

        envelope
            .result
            .ok_or_else(|| CoreError::Internal("Bot API response missing result".to_string()))
    }
}

#[async_trait]
impl ChannelMessenger for TelegramMessenger {
    #[instrument(skip(self, text))]
    async fn send_message(&self, user_id: i64, text: &str) -> Result<(), CoreError> {
        debug!(user_id = %user_id, "Sending direct message");

        let _: Message = self
            .call("sendMessage", &json!({ "chat_id": user_id, "text": text }))
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_invite_link(&self, name: &str) -> Result<String, CoreError> {
        debug!(name = %name, "Creating invite link");

        let link: ChatInviteLink = self
            .call(
                "createChatInviteLink",
                &json!({ "chat_id": self.channel_id, "member_limit": 1, "name": name }),
            )
            .await?;

        Ok(link.invite_link)
    }

    #[instrument(skip(self))]
    async fn kick_member(&self, user_id: i64) -> Result<(), CoreError> {
        debug!(user_id = %user_id, "Removing member from channel");

        let _: bool = self
            .call(
                "banChatMember",
                &json!({ "chat_id": self.channel_id, "user_id": user_id }),
            )
            .await?;

        let _: bool = self
            .call(
                "unbanChatMember",
                &json!({ "chat_id": self.channel_id, "user_id": user_id }),
            )
            .await?;

        Ok(())
    }
}

// Bot API response types

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[allow(dead_code)]
    message_id: i64,
}

#[derive(Debug, Deserialize)]
struct ChatInviteLink {
    invite_link: String,
}
