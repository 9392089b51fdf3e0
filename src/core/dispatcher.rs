use crate::adapters::{build_http_client, CrmContactChannel, EmailChannel, WebhookChannel};
use crate::config::RelayConfig;
use crate::domain::model::{ChannelKind, DeliveryOutcome, Submission};
use crate::domain::ports::DeliveryChannel;
use crate::utils::error::{RelayError, Result};
use std::time::Instant;

/// Walks an ordered list of channels until one delivers.
///
/// Every channel is attempted at most once per dispatch, strictly in order,
/// and each dispatch yields exactly one [`DeliveryOutcome`].
pub struct Dispatcher {
    channels: Vec<Box<dyn DeliveryChannel>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("channels", &self.channel_kinds())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(channels: Vec<Box<dyn DeliveryChannel>>) -> Result<Self> {
        if channels.is_empty() {
            return Err(RelayError::ConfigError {
                message: "a dispatcher needs at least one delivery channel".to_string(),
            });
        }
        Ok(Self { channels })
    }

    /// Builds the chain named in `dispatch.channels`, sharing one HTTP client.
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let client = build_http_client(config)?;
        let mut channels: Vec<Box<dyn DeliveryChannel>> = Vec::new();

        for kind in config.channel_order()? {
            let channel: Box<dyn DeliveryChannel> = match kind {
                ChannelKind::TransactionalEmail => {
                    Box::new(EmailChannel::from_config(client.clone(), config))
                }
                ChannelKind::CrmContact => {
                    Box::new(CrmContactChannel::from_config(client.clone(), config)?)
                }
                ChannelKind::CrmWebhook => {
                    Box::new(WebhookChannel::from_config(client.clone(), config)?)
                }
                ChannelKind::Mailto => {
                    return Err(RelayError::InvalidConfigValueError {
                        field: "dispatch.channels".to_string(),
                        value: kind.to_string(),
                        reason: "mailto is opened by the capture flow, not dispatched".to_string(),
                    })
                }
            };
            channels.push(channel);
        }

        Self::new(channels)
    }

    pub fn channel_kinds(&self) -> Vec<ChannelKind> {
        self.channels.iter().map(|c| c.kind()).collect()
    }

    pub async fn dispatch(&self, submission: &Submission) -> DeliveryOutcome {
        let start = Instant::now();
        let mut failures: Vec<String> = Vec::new();
        let mut last_kind = self.channels[0].kind();

        for (index, channel) in self.channels.iter().enumerate() {
            let kind = channel.kind();
            last_kind = kind;
            tracing::debug!(
                "🚚 Attempting {} ({}/{}) for {}",
                kind,
                index + 1,
                self.channels.len(),
                submission.calculator_name()
            );

            match channel.attempt(submission).await {
                Ok(response) if response.confirmed => {
                    tracing::info!("✅ Lead delivered via {} in {:?}", kind, start.elapsed());
                    return DeliveryOutcome::Delivered {
                        channel: kind,
                        response,
                    };
                }
                Ok(response) => {
                    tracing::warn!(
                        "⚠️ Lead handed to {} without acknowledgement (status {:?})",
                        kind,
                        response.status
                    );
                    return DeliveryOutcome::FallbackUsed { channel: kind };
                }
                Err(failure) => {
                    tracing::warn!("❌ {} failed: {}", kind, failure);
                    failures.push(format!("{}: {}", kind, failure));
                }
            }
        }

        tracing::error!(
            "❌ All {} channel(s) failed for {}",
            self.channels.len(),
            submission.calculator_name()
        );
        DeliveryOutcome::Failed {
            channel: last_kind,
            error_detail: failures.join("; "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ChannelFailure, ContactDetails, ProviderResponse, ResultMapping};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Behaviour {
        Confirm,
        FireAndForget,
        Fail,
    }

    struct StubChannel {
        kind: ChannelKind,
        behaviour: Behaviour,
        calls: Arc<AtomicUsize>,
    }

    impl StubChannel {
        fn boxed(kind: ChannelKind, behaviour: Behaviour) -> (Box<dyn DeliveryChannel>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let channel = StubChannel {
                kind,
                behaviour,
                calls: calls.clone(),
            };
            (Box::new(channel), calls)
        }
    }

    #[async_trait::async_trait]
    impl DeliveryChannel for StubChannel {
        fn kind(&self) -> ChannelKind {
            self.kind
        }

        async fn attempt(
            &self,
            _submission: &Submission,
        ) -> std::result::Result<ProviderResponse, ChannelFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Confirm => Ok(ProviderResponse::confirmed(200, serde_json::json!({"ok": true}))),
                Behaviour::FireAndForget => Ok(ProviderResponse::unconfirmed(None)),
                Behaviour::Fail => Err(ChannelFailure::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                }),
            }
        }
    }

    fn submission() -> Submission {
        let contact = ContactDetails {
            name: "Jane".to_string(),
            email: "jane@example.nl".to_string(),
            phone: None,
        };
        Submission::new(&contact, "Hypotheek", ResultMapping::new().with("a", 1), "", Utc::now())
            .unwrap()
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert!(Dispatcher::new(Vec::new()).is_err());
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallbacks() {
        let (email, email_calls) = StubChannel::boxed(ChannelKind::TransactionalEmail, Behaviour::Confirm);
        let (crm, crm_calls) = StubChannel::boxed(ChannelKind::CrmContact, Behaviour::Confirm);
        let dispatcher = Dispatcher::new(vec![email, crm]).unwrap();

        let outcome = dispatcher.dispatch(&submission()).await;

        assert!(matches!(
            outcome,
            DeliveryOutcome::Delivered {
                channel: ChannelKind::TransactionalEmail,
                ..
            }
        ));
        assert_eq!(email_calls.load(Ordering::SeqCst), 1);
        assert_eq!(crm_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unacknowledged_fallback_reported_as_fallback_used() {
        let (crm, crm_calls) = StubChannel::boxed(ChannelKind::CrmContact, Behaviour::Fail);
        let (hook, hook_calls) = StubChannel::boxed(ChannelKind::CrmWebhook, Behaviour::FireAndForget);
        let dispatcher = Dispatcher::new(vec![crm, hook]).unwrap();

        let outcome = dispatcher.dispatch(&submission()).await;

        assert_eq!(
            outcome,
            DeliveryOutcome::FallbackUsed {
                channel: ChannelKind::CrmWebhook
            }
        );
        assert_eq!(crm_calls.load(Ordering::SeqCst), 1);
        assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_chain_reports_every_failure_once() {
        let (email, email_calls) = StubChannel::boxed(ChannelKind::TransactionalEmail, Behaviour::Fail);
        let (crm, crm_calls) = StubChannel::boxed(ChannelKind::CrmContact, Behaviour::Fail);
        let dispatcher = Dispatcher::new(vec![email, crm]).unwrap();

        let outcome = dispatcher.dispatch(&submission()).await;

        match outcome {
            DeliveryOutcome::Failed {
                channel,
                error_detail,
            } => {
                assert_eq!(channel, ChannelKind::CrmContact);
                assert!(error_detail.contains("transactional-email: provider returned status 503"));
                assert!(error_detail.contains("crm-contact: provider returned status 503"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(email_calls.load(Ordering::SeqCst), 1);
        assert_eq!(crm_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_config_builds_requested_order() {
        let mut config = RelayConfig::for_operator("ops@finaforte.nl");
        config.dispatch.channels = vec!["email".into(), "crm".into()];
        config.crm.api_key = Some("key".to_string());
        config.crm.location_id = Some("loc".to_string());

        let dispatcher = Dispatcher::from_config(&config).unwrap();
        assert_eq!(
            dispatcher.channel_kinds(),
            vec![
                ChannelKind::TransactionalEmail,
                ChannelKind::CrmContact,
                ChannelKind::CrmWebhook
            ]
        );
    }
}
