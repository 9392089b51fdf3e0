use chrono::{DateTime, Local, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// A single computed value shown to the user: either free text or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultValue {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultValue::Number(n) => write!(f, "{}", n),
            ResultValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ResultValue {
    fn from(value: &str) -> Self {
        ResultValue::Text(value.to_string())
    }
}

impl From<String> for ResultValue {
    fn from(value: String) -> Self {
        ResultValue::Text(value)
    }
}

impl From<i64> for ResultValue {
    fn from(value: i64) -> Self {
        ResultValue::Number(value.into())
    }
}

impl From<f64> for ResultValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(ResultValue::Number)
            .unwrap_or_else(|| ResultValue::Text(value.to_string()))
    }
}

/// Ordered label -> value output of a calculator.
///
/// Entries keep their insertion order through JSON round trips, so every
/// channel lists the results the way the calculator produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultMapping {
    entries: Vec<(String, ResultValue)>,
}

impl ResultMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. A repeated label replaces the earlier value in place.
    pub fn with(mut self, label: impl Into<String>, value: impl Into<ResultValue>) -> Self {
        self.insert(label, value);
        self
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<ResultValue>) {
        let label = label.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&ResultValue> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResultValue)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `label: value` lines joined by `\n`, optionally prefixed per line.
    pub fn to_lines(&self, prefix: &str) -> String {
        self.iter()
            .map(|(label, value)| format!("{}{}: {}", prefix, label, value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<K: Into<String>, V: Into<ResultValue>> FromIterator<(K, V)> for ResultMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = ResultMapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

impl Serialize for ResultMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResultMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = ResultMapping;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of result labels to strings or numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut mapping = ResultMapping::new();
                while let Some((label, value)) = access.next_entry::<String, ResultValue>()? {
                    mapping.insert(label, value);
                }
                Ok(mapping)
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}

/// Contact fields as typed into the form, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// One captured lead. Built by the capture surface after validation and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    name: String,
    email: String,
    phone: Option<String>,
    calculator_name: String,
    results: ResultMapping,
    source_url: String,
    timestamp: DateTime<Utc>,
}

impl Submission {
    /// Validates the contact fields and freezes the record.
    pub fn new(
        contact: &ContactDetails,
        calculator_name: impl Into<String>,
        results: ResultMapping,
        source_url: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> crate::utils::error::Result<Self> {
        use crate::utils::validation::{validate_email_input, validate_required_input};

        validate_required_input("name", &contact.name)?;
        validate_email_input("email", &contact.email)?;

        let phone = contact
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: contact.name.trim().to_string(),
            email: contact.email.trim().to_string(),
            phone,
            calculator_name: calculator_name.into(),
            results,
            source_url: source_url.into(),
            timestamp,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn calculator_name(&self) -> &str {
        &self.calculator_name
    }

    pub fn results(&self) -> &ResultMapping {
        &self.results
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Day-first local time, the way the operator reads it in their inbox.
    pub fn display_timestamp(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%d-%m-%Y %H:%M:%S")
            .to_string()
    }

    pub fn contact(&self) -> ContactDetails {
        ContactDetails {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }

    /// First whitespace-delimited token and the remainder (possibly empty).
    pub fn split_name(&self) -> (String, String) {
        split_full_name(&self.name)
    }
}

pub fn split_full_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    TransactionalEmail,
    CrmContact,
    CrmWebhook,
    Mailto,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelKind::TransactionalEmail => "transactional-email",
            ChannelKind::CrmContact => "crm-contact",
            ChannelKind::CrmWebhook => "crm-webhook",
            ChannelKind::Mailto => "mailto",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderResponse {
    pub status: Option<u16>,
    pub body: serde_json::Value,
    /// Whether the provider acknowledged receipt. Fire-and-forget requests
    /// report `false` even when they went out.
    pub confirmed: bool,
}

impl ProviderResponse {
    pub fn confirmed(status: u16, body: serde_json::Value) -> Self {
        Self {
            status: Some(status),
            body,
            confirmed: true,
        }
    }

    pub fn unconfirmed(status: Option<u16>) -> Self {
        Self {
            status,
            body: serde_json::Value::Null,
            confirmed: false,
        }
    }
}

/// Why a single channel attempt did not deliver.
#[derive(Debug, Error)]
pub enum ChannelFailure {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    Serialization(String),

    #[error("could not build request: {0}")]
    Request(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered {
        channel: ChannelKind,
        response: ProviderResponse,
    },
    Failed {
        channel: ChannelKind,
        error_detail: String,
    },
    FallbackUsed {
        channel: ChannelKind,
    },
}

impl DeliveryOutcome {
    pub fn channel(&self) -> ChannelKind {
        match self {
            DeliveryOutcome::Delivered { channel, .. }
            | DeliveryOutcome::Failed { channel, .. }
            | DeliveryOutcome::FallbackUsed { channel } => *channel,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, DeliveryOutcome::Failed { .. })
    }
}
