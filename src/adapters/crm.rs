use crate::adapters::confirmed_json_response;
use crate::config::RelayConfig;
use crate::domain::model::{ChannelFailure, ChannelKind, ProviderResponse, Submission};
use crate::domain::ports::DeliveryChannel;
use crate::utils::error::Result;
use reqwest::Client;
use serde::Serialize;

/// Contact document accepted by the CRM contacts API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub location_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub source: String,
    pub tags: Vec<String>,
    pub custom_fields: Vec<serde_json::Value>,
    pub notes: String,
}

pub struct CrmContactChannel {
    client: Client,
    api_url: String,
    api_key: String,
    api_version: String,
    location_id: String,
    lead_source: String,
    lead_tag: String,
}

impl CrmContactChannel {
    pub fn from_config(client: Client, config: &RelayConfig) -> Result<Self> {
        Ok(Self {
            client,
            api_url: config.crm.api_url.clone(),
            api_key: config.crm_api_key()?.to_string(),
            api_version: config.crm.api_version.clone(),
            location_id: config.crm_location_id()?.to_string(),
            lead_source: config.crm.lead_source.clone(),
            lead_tag: config.crm.lead_tag.clone(),
        })
    }

    pub fn contact_record(&self, submission: &Submission) -> ContactRecord {
        let (first_name, last_name) = submission.split_name();

        let notes = format!(
            "Calculator: {}\n\nResultaten:\n{}\n\nIngevuld op: {}",
            submission.calculator_name(),
            submission.results().to_lines(""),
            submission.display_timestamp()
        );

        ContactRecord {
            location_id: self.location_id.clone(),
            first_name,
            last_name,
            email: submission.email().to_string(),
            phone: submission.phone().unwrap_or_default().to_string(),
            source: self.lead_source.clone(),
            tags: vec![
                self.lead_tag.clone(),
                format!("Calculator: {}", submission.calculator_name()),
            ],
            custom_fields: Vec::new(),
            notes,
        }
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for CrmContactChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::CrmContact
    }

    async fn attempt(
        &self,
        submission: &Submission,
    ) -> std::result::Result<ProviderResponse, ChannelFailure> {
        let contact = self.contact_record(submission);

        tracing::debug!("📇 Creating CRM contact at {}", self.api_url);
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("Version", &self.api_version)
            .json(&contact)
            .send()
            .await?;
        tracing::debug!("📇 CRM API responded with {}", response.status());

        confirmed_json_response(response).await
    }
}
