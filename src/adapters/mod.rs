// Adapters layer: concrete channels for external providers and host integrations.

pub mod crm;
pub mod email;
pub mod mailto;
pub mod opener;
pub mod webhook;

use crate::config::RelayConfig;
use crate::domain::model::{ChannelFailure, ProviderResponse};
use crate::utils::error::Result;
use reqwest::Client;

pub use crm::CrmContactChannel;
pub use email::EmailChannel;
pub use mailto::MailtoFallback;
pub use opener::{StdoutOpener, SystemOpener};
pub use webhook::WebhookChannel;

/// Shared HTTP client for every channel of one dispatcher.
pub fn build_http_client(config: &RelayConfig) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// A 2xx response with a JSON body counts as an acknowledged delivery.
pub(crate) async fn confirmed_json_response(
    response: reqwest::Response,
) -> std::result::Result<ProviderResponse, ChannelFailure> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ChannelFailure::Status {
            status: status.as_u16(),
            body,
        });
    }

    let json: serde_json::Value =
        serde_json::from_str(&body).map_err(|e| ChannelFailure::Serialization(e.to_string()))?;

    Ok(ProviderResponse::confirmed(status.as_u16(), json))
}
