use crate::domain::model::ChannelKind;
use crate::utils::error::{RelayError, Result};
use crate::utils::validation::{
    validate_email, validate_hex_color, validate_non_empty_string, validate_range,
    validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_EMAIL_ENDPOINT: &str = "https://formsubmit.co/ajax";
pub const DEFAULT_CRM_API_URL: &str = "https://services.leadconnectorhq.com/contacts/";
pub const DEFAULT_WEBHOOK_BASE_URL: &str = "https://services.leadconnectorhq.com/hooks";
pub const DEFAULT_CRM_API_VERSION: &str = "2021-07-28";

/// Everything the relay needs to reach its providers. Passed explicitly into
/// the dispatcher and the capture surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    pub operator: OperatorConfig,
    #[serde(default)]
    pub branding: BrandingConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub crm: CrmConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    #[serde(default = "default_company_name")]
    pub company_name: String,
    /// Mailbox that receives email leads and mailto drafts.
    pub email_to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandingConfig {
    pub brand_color: String,
    pub accent_color: String,
    /// Pause between the success state and closing the form.
    pub close_delay_ms: u64,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            brand_color: "#1AABA6".to_string(),
            accent_color: "#F28E18".to_string(),
            close_delay_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Ordered channel names: "email", "crm". The CRM webhook always runs
    /// right after "crm" and may be named there as "webhook".
    pub channels: Vec<String>,
    pub mailto_fallback: bool,
    pub timeout_seconds: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            channels: vec!["email".to_string(), "crm".to_string()],
            mailto_fallback: true,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub endpoint: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_EMAIL_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub location_id: Option<String>,
    pub api_version: String,
    pub lead_source: String,
    pub lead_tag: String,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_CRM_API_URL.to_string(),
            api_key: None,
            location_id: None,
            api_version: DEFAULT_CRM_API_VERSION.to_string(),
            lead_source: "Finaforte Calculator".to_string(),
            lead_tag: "Calculator Lead".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub base_url: String,
    /// Falls back to `crm.location_id` when unset.
    pub location_id: Option<String>,
    pub source_tag: String,
    /// Treat non-2xx webhook responses as failures instead of firing and forgetting.
    pub require_ack: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WEBHOOK_BASE_URL.to_string(),
            location_id: None,
            source_tag: "Finaforte Mini-Calculator".to_string(),
            require_ack: false,
        }
    }
}

fn default_company_name() -> String {
    "Finaforte".to_string()
}

pub fn parse_channel_name(name: &str) -> Result<ChannelKind> {
    match name.trim().to_ascii_lowercase().as_str() {
        "email" => Ok(ChannelKind::TransactionalEmail),
        "crm" => Ok(ChannelKind::CrmContact),
        "webhook" => Ok(ChannelKind::CrmWebhook),
        other => Err(RelayError::InvalidConfigValueError {
            field: "dispatch.channels".to_string(),
            value: other.to_string(),
            reason: "Unknown channel. Valid channels: email, crm, webhook".to_string(),
        }),
    }
}

impl RelayConfig {
    /// Default chain for one operator mailbox. CRM credentials still have to
    /// be filled in unless `dispatch.channels` is narrowed to email.
    pub fn for_operator(email_to: impl Into<String>) -> Self {
        Self {
            operator: OperatorConfig {
                company_name: default_company_name(),
                email_to: email_to.into(),
            },
            branding: BrandingConfig::default(),
            dispatch: DispatchConfig::default(),
            email: EmailConfig::default(),
            crm: CrmConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RelayError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RelayError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RelayError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Attempt order. "crm" expands to the contact API followed by its
    /// webhook; a "webhook" entry is only accepted directly after "crm".
    pub fn channel_order(&self) -> Result<Vec<ChannelKind>> {
        let mut order = Vec::with_capacity(self.dispatch.channels.len() + 1);
        let mut after_crm = false;

        for name in &self.dispatch.channels {
            match parse_channel_name(name)? {
                ChannelKind::CrmContact => {
                    order.push(ChannelKind::CrmContact);
                    order.push(ChannelKind::CrmWebhook);
                    after_crm = true;
                    continue;
                }
                ChannelKind::CrmWebhook if after_crm => {}
                ChannelKind::CrmWebhook => {
                    return Err(RelayError::InvalidConfigValueError {
                        field: "dispatch.channels".to_string(),
                        value: name.clone(),
                        reason: "The webhook is the CRM channel's fallback; list \"crm\" instead"
                            .to_string(),
                    })
                }
                kind => order.push(kind),
            }
            after_crm = false;
        }

        Ok(order)
    }

    pub fn crm_api_key(&self) -> Result<&str> {
        let key = validate_required_field("crm.api_key", &self.crm.api_key)?;
        require_resolved("crm.api_key", key)?;
        Ok(key.as_str())
    }

    pub fn crm_location_id(&self) -> Result<&str> {
        let id = validate_required_field("crm.location_id", &self.crm.location_id)?;
        require_resolved("crm.location_id", id)?;
        Ok(id.as_str())
    }

    pub fn webhook_location_id(&self) -> Result<&str> {
        match &self.webhook.location_id {
            Some(id) => {
                require_resolved("webhook.location_id", id)?;
                Ok(id.as_str())
            }
            None => self.crm_location_id(),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.dispatch.timeout_seconds.map(Duration::from_secs)
    }

    pub fn close_delay(&self) -> Duration {
        Duration::from_millis(self.branding.close_delay_ms)
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("operator.company_name", &self.operator.company_name)?;
        validate_email("operator.email_to", &self.operator.email_to)?;
        validate_hex_color("branding.brand_color", &self.branding.brand_color)?;
        validate_hex_color("branding.accent_color", &self.branding.accent_color)?;
        validate_range("branding.close_delay_ms", self.branding.close_delay_ms, 0, 60_000)?;

        if let Some(timeout) = self.dispatch.timeout_seconds {
            validate_range("dispatch.timeout_seconds", timeout, 1, 300)?;
        }

        let order = self.channel_order()?;
        if order.is_empty() {
            return Err(RelayError::ConfigValidationError {
                field: "dispatch.channels".to_string(),
                message: "at least one delivery channel must be configured".to_string(),
            });
        }
        for (i, kind) in order.iter().enumerate() {
            if order[..i].contains(kind) {
                return Err(RelayError::InvalidConfigValueError {
                    field: "dispatch.channels".to_string(),
                    value: kind.to_string(),
                    reason: "Each channel may appear only once".to_string(),
                });
            }
        }

        if order.contains(&ChannelKind::TransactionalEmail) {
            validate_url("email.endpoint", &self.email.endpoint)?;
        }
        if order.contains(&ChannelKind::CrmContact) {
            validate_url("crm.api_url", &self.crm.api_url)?;
            self.crm_api_key()?;
            self.crm_location_id()?;
            validate_non_empty_string("crm.api_version", &self.crm.api_version)?;
        }
        if order.contains(&ChannelKind::CrmWebhook) {
            validate_url("webhook.base_url", &self.webhook.base_url)?;
            self.webhook_location_id()?;
        }

        Ok(())
    }
}

fn require_resolved(field: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field, value)?;
    if value.contains("${") {
        return Err(RelayError::MissingConfigError {
            field: format!("{} (unset environment variable in {})", field, value),
        });
    }
    Ok(())
}

impl Validate for RelayConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
