use crate::adapters::MailtoFallback;
use crate::app::presentation::{lock_surface, SharedSurface, UiState};
use crate::config::RelayConfig;
use crate::core::Dispatcher;
use crate::domain::model::{ContactDetails, DeliveryOutcome};
use crate::domain::ports::UriOpener;
use crate::utils::error::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// What the form does when every programmatic channel failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePolicy {
    /// Open a mailto draft and show the form as sent.
    EmailWithMailto,
    /// Show "try again" and keep the form open.
    CrmOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureResult {
    pub outcome: DeliveryOutcome,
    pub ui_state: UiState,
    /// The form was removed and its completion callback ran.
    pub completed: bool,
}

/// Connects the capture surface to the dispatcher for one page.
pub struct LeadCapture {
    dispatcher: Dispatcher,
    mailto: Option<MailtoFallback>,
    policy: CapturePolicy,
    close_delay: Duration,
}

impl LeadCapture {
    pub fn new(
        dispatcher: Dispatcher,
        mailto: Option<MailtoFallback>,
        policy: CapturePolicy,
        close_delay: Duration,
    ) -> Self {
        Self {
            dispatcher,
            mailto,
            policy,
            close_delay,
        }
    }

    pub fn from_config(
        config: &RelayConfig,
        policy: CapturePolicy,
        opener: Arc<dyn UriOpener>,
    ) -> Result<Self> {
        let dispatcher = Dispatcher::from_config(config)?;
        let mailto = (policy == CapturePolicy::EmailWithMailto && config.dispatch.mailto_fallback)
            .then(|| MailtoFallback::new(config.operator.email_to.clone(), opener));

        Ok(Self::new(dispatcher, mailto, policy, config.close_delay()))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Runs one submit event end to end. The surface lock is never held while
    /// a request is in flight.
    pub async fn submit(
        &self,
        surface: &SharedSurface,
        contact: ContactDetails,
        source_url: &str,
    ) -> Result<CaptureResult> {
        let (instance_id, submission) = {
            let mut guard = lock_surface(surface);
            let submission = guard.submit(contact, source_url, Utc::now())?;
            let instance_id = guard.instance_id().unwrap_or_default();
            (instance_id, submission)
        };

        tracing::info!(
            "📨 Dispatching lead for {} via {:?}",
            submission.calculator_name(),
            self.dispatcher.channel_kinds()
        );
        let outcome = match (self.dispatcher.dispatch(&submission).await, &self.mailto) {
            (DeliveryOutcome::Failed { error_detail, .. }, Some(mailto)) => {
                tracing::warn!("✉️ Falling back to mailto after: {}", error_detail);
                mailto.open(&submission)
            }
            (outcome, _) => outcome,
        };

        let ui_state = match lock_surface(surface).apply_outcome(instance_id, &outcome) {
            Ok(state) => state,
            Err(_) => {
                tracing::debug!("🗂️ Form {} was replaced during dispatch", instance_id);
                UiState::for_outcome(&outcome)
            }
        };

        let mut completed = false;
        if ui_state.is_success() {
            if !self.close_delay.is_zero() {
                tokio::time::sleep(self.close_delay).await;
            }
            let completion = lock_surface(surface).complete(instance_id);
            if let Some(completion) = completion {
                completion.run();
                completed = true;
            }
        } else if self.policy == CapturePolicy::CrmOnly {
            tracing::info!("🔁 Delivery failed, form left open for another try");
        }

        Ok(CaptureResult {
            outcome,
            ui_state,
            completed,
        })
    }
}
