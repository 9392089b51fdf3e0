use crate::config::RelayConfig;
use crate::domain::model::{ChannelFailure, ChannelKind, ProviderResponse, Submission};
use crate::domain::ports::DeliveryChannel;
use crate::utils::error::Result;
use chrono::SecondsFormat;
use reqwest::Client;
use serde::Serialize;

/// Simplified lead document for the tenant's inbound webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookPayload {
    pub naam: String,
    pub email: String,
    pub telefoon: String,
    pub calculator: String,
    /// The result mapping serialized to a JSON string.
    pub resultaten: String,
    pub bron: String,
    pub timestamp: String,
}

/// Inbound-webhook fallback for the CRM.
///
/// By default the request is fire-and-forget: once it has gone out the attempt
/// succeeds, whatever the remote answers, and the response is marked
/// unconfirmed. With `require_ack` a non-2xx status fails the attempt.
pub struct WebhookChannel {
    client: Client,
    url: String,
    source_tag: String,
    require_ack: bool,
}

impl WebhookChannel {
    pub fn from_config(client: Client, config: &RelayConfig) -> Result<Self> {
        let location_id = config.webhook_location_id()?;
        Ok(Self {
            client,
            url: format!(
                "{}/{}/webhook-trigger",
                config.webhook.base_url.trim_end_matches('/'),
                location_id
            ),
            source_tag: config.webhook.source_tag.clone(),
            require_ack: config.webhook.require_ack,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn payload(
        &self,
        submission: &Submission,
    ) -> std::result::Result<WebhookPayload, ChannelFailure> {
        let resultaten = serde_json::to_string(submission.results())
            .map_err(|e| ChannelFailure::Request(e.to_string()))?;

        Ok(WebhookPayload {
            naam: submission.name().to_string(),
            email: submission.email().to_string(),
            telefoon: submission.phone().unwrap_or_default().to_string(),
            calculator: submission.calculator_name().to_string(),
            resultaten,
            bron: self.source_tag.clone(),
            timestamp: submission
                .timestamp()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for WebhookChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::CrmWebhook
    }

    async fn attempt(
        &self,
        submission: &Submission,
    ) -> std::result::Result<ProviderResponse, ChannelFailure> {
        let payload = self.payload(submission)?;

        tracing::debug!("🪝 Triggering CRM webhook at {}", self.url);
        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();

        if !self.require_ack {
            tracing::debug!("🪝 Webhook dispatched (status {} not checked)", status);
            return Ok(ProviderResponse::unconfirmed(Some(status.as_u16())));
        }

        if !status.is_success() {
            let body = response.text().await?;
            return Err(ChannelFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(ProviderResponse {
            status: Some(status.as_u16()),
            body: serde_json::Value::Null,
            confirmed: true,
        })
    }
}
