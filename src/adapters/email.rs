use crate::adapters::confirmed_json_response;
use crate::config::RelayConfig;
use crate::domain::model::{ChannelFailure, ChannelKind, ProviderResponse, Submission};
use crate::domain::ports::DeliveryChannel;
use reqwest::multipart::Form;
use reqwest::Client;

pub const PHONE_PLACEHOLDER: &str = "Niet ingevuld";

/// Transactional email through a form-to-mail service addressed to the
/// operator mailbox.
pub struct EmailChannel {
    client: Client,
    endpoint: String,
}

impl EmailChannel {
    pub fn new(client: Client, endpoint_base: &str, operator_email: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/{}", endpoint_base.trim_end_matches('/'), operator_email),
        }
    }

    pub fn from_config(client: Client, config: &RelayConfig) -> Self {
        Self::new(client, &config.email.endpoint, &config.operator.email_to)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ordered form fields; results follow the fixed lead fields.
    pub fn form_fields(submission: &Submission) -> Vec<(String, String)> {
        let mut fields = vec![
            (
                "_subject".to_string(),
                format!("📊 Nieuwe Lead: {}", submission.calculator_name()),
            ),
            ("_template".to_string(), "table".to_string()),
            ("_captcha".to_string(), "false".to_string()),
            (
                "Calculator".to_string(),
                submission.calculator_name().to_string(),
            ),
            ("Naam".to_string(), submission.name().to_string()),
            ("Email".to_string(), submission.email().to_string()),
            (
                "Telefoon".to_string(),
                submission.phone().unwrap_or(PHONE_PLACEHOLDER).to_string(),
            ),
            ("Datum".to_string(), submission.display_timestamp()),
            ("Pagina".to_string(), submission.source_url().to_string()),
        ];

        fields.extend(
            submission
                .results()
                .iter()
                .map(|(label, value)| (label.to_string(), value.to_string())),
        );
        fields
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::TransactionalEmail
    }

    async fn attempt(
        &self,
        submission: &Submission,
    ) -> Result<ProviderResponse, ChannelFailure> {
        let form = Self::form_fields(submission)
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        tracing::debug!("📧 Posting lead form to {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .multipart(form)
            .send()
            .await?;
        tracing::debug!("📧 Email endpoint responded with {}", response.status());

        confirmed_json_response(response).await
    }
}
