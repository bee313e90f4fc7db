// Slack incoming-webhook chat transport

use crate::errors::NotifyError;
use crate::notify::{ChatTransport, Delivery};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Chat transport posting to a Slack-compatible incoming webhook
///
/// The webhook URL is optional; without one every post is skipped and
/// chat stays a best-effort channel.
pub struct SlackWebhook {
    webhook_url: Option<String>,
    client: Client,
}

impl SlackWebhook {
    /// Create a new webhook transport with the specified timeout
    pub fn new(webhook_url: Option<String>, timeout_seconds: u64) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| {
                NotifyError::WebhookSetup(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            webhook_url,
            client,
        })
    }
}

#[async_trait]
impl ChatTransport for SlackWebhook {
    #[tracing::instrument(skip(self, text))]
    async fn post(&self, text: &str) -> Result<Delivery, NotifyError> {
        let Some(url) = &self.webhook_url else {
            return Ok(Delivery::Skipped {
                reason: "webhook URL not configured".to_string(),
            });
        };

        let response = self
            .client
            .post(url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| NotifyError::WebhookRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::WebhookStatus {
                status: status.as_u16(),
            });
        }

        tracing::debug!("Chat message accepted by webhook");
        Ok(Delivery::Sent)
    }
}
