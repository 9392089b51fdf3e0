use crate::domain::model::{ChannelFailure, ChannelKind, ProviderResponse, Submission};
use crate::utils::error::Result;
use async_trait::async_trait;

/// One outbound delivery strategy in the fallback chain.
///
/// An attempt issues exactly one outbound call and never retries on its own.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    async fn attempt(
        &self,
        submission: &Submission,
    ) -> std::result::Result<ProviderResponse, ChannelFailure>;
}

/// Hands a URI to the host environment (a mail client for `mailto:` links).
pub trait UriOpener: Send + Sync {
    fn open(&self, uri: &str) -> Result<()>;
}
