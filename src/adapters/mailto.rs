use crate::adapters::email::PHONE_PLACEHOLDER;
use crate::domain::model::{ChannelKind, DeliveryOutcome, Submission};
use crate::domain::ports::UriOpener;
use std::sync::Arc;

/// Last resort: a pre-filled draft in the user's own mail client.
pub struct MailtoFallback {
    operator_email: String,
    opener: Arc<dyn UriOpener>,
}

impl MailtoFallback {
    pub fn new(operator_email: impl Into<String>, opener: Arc<dyn UriOpener>) -> Self {
        Self {
            operator_email: operator_email.into(),
            opener,
        }
    }

    pub fn subject(submission: &Submission) -> String {
        format!("Nieuwe Calculator Lead: {}", submission.calculator_name())
    }

    pub fn body(submission: &Submission) -> String {
        format!(
            "NIEUWE CALCULATOR LEAD\n\
             ======================\n\
             \n\
             Calculator: {calculator}\n\
             Datum: {date}\n\
             \n\
             KLANTGEGEVENS:\n\
             • Naam: {name}\n\
             • Email: {email}\n\
             • Telefoon: {phone}\n\
             \n\
             RESULTATEN:\n\
             {results}\n\
             \n\
             ---\n\
             Bron: {source}\n",
            calculator = submission.calculator_name(),
            date = submission.display_timestamp(),
            name = submission.name(),
            email = submission.email(),
            phone = submission.phone().unwrap_or(PHONE_PLACEHOLDER),
            results = submission.results().to_lines("• "),
            source = submission.source_url(),
        )
    }

    pub fn build_uri(&self, submission: &Submission) -> String {
        format!(
            "mailto:{}?subject={}&body={}",
            self.operator_email,
            urlencoding::encode(&Self::subject(submission)),
            urlencoding::encode(&Self::body(submission)),
        )
    }

    /// Opens the draft. Nothing further can be confirmed programmatically, so
    /// the outcome is always a used fallback.
    pub fn open(&self, submission: &Submission) -> DeliveryOutcome {
        let uri = self.build_uri(submission);
        if let Err(e) = self.opener.open(&uri) {
            tracing::error!("✉️ Could not hand mailto draft to the host: {}", e);
        } else {
            tracing::info!("✉️ Mailto draft opened for {}", submission.calculator_name());
        }

        DeliveryOutcome::FallbackUsed {
            channel: ChannelKind::Mailto,
        }
    }
}
