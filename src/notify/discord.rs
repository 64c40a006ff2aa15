//! Discord REST delivery
//!
//! Endpoint: `POST {api_base}/channels/{channel_id}/messages`
//! Body: `{"content": "...", "embeds": [NotificationPayload]}`

use super::dispatcher::DeliveryChannel;
use super::message::NotificationPayload;
use crate::error::MonitorError;
use crate::registry::Destination;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
    embeds: [&'a NotificationPayload; 1],
}

pub struct DiscordRestDelivery {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl DiscordRestDelivery {
    /// Arguments:
    /// - `api_base`: REST root, e.g. `https://discord.com/api/v10` (trailing `/` ignored)
    /// - `token`: bot token, sent as `Authorization: Bot <token>`
    /// - `timeout`: applied to every request
    pub fn new(api_base: &str, token: &str, timeout: Duration) -> Result<Self, MonitorError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn message_url(&self, destination: &Destination) -> String {
        format!("{}/channels/{}/messages", self.api_base, destination.channel_id)
    }
}

#[async_trait]
impl DeliveryChannel for DiscordRestDelivery {
    async fn send(
        &self,
        destination: &Destination,
        text: &str,
        payload: &NotificationPayload,
    ) -> Result<(), MonitorError> {
        let body = CreateMessage {
            content: text,
            embeds: [payload],
        };

        let delivery_error = |reason: String| MonitorError::Delivery {
            channel: destination.channel_id,
            reason,
        };

        let response = self
            .client
            .post(self.message_url(destination))
            .header("Authorization", format!("Bot {}", self.token))
            .json(&body)
            .send()
            .await
            .map_err(|e| delivery_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // 403 = permission revoked, 404 = channel deleted
            let detail = response.text().await.unwrap_or_default();
            return Err(delivery_error(format!("HTTP {}: {}", status, detail)));
        }

        Ok(())
    }
}
