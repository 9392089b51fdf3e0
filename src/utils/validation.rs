use crate::utils::error::{RelayError, Result};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const HEX_COLOR_PATTERN: &str = r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$";

// Compiled once. A broken literal panics on first use.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("EMAIL_PATTERN is a valid regex"));
static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(HEX_COLOR_PATTERN).expect("HEX_COLOR_PATTERN is a valid regex"));

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(RelayError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn is_email_shaped(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Config-side email check; form input goes through `validate_email_input`.
pub fn validate_email(field_name: &str, value: &str) -> Result<()> {
    if !is_email_shaped(value) {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value is not a valid email address".to_string(),
        });
    }
    Ok(())
}

pub fn validate_email_input(field_name: &str, value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RelayError::validation(field_name, "this field is required"));
    }
    if !is_email_shaped(trimmed) {
        return Err(RelayError::validation(
            field_name,
            "enter a valid email address",
        ));
    }
    Ok(())
}

pub fn validate_required_input(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RelayError::validation(field_name, "this field is required"));
    }
    Ok(())
}

pub fn validate_hex_color(field_name: &str, value: &str) -> Result<()> {
    if !HEX_COLOR_RE.is_match(value) {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Expected a hex color such as #1AABA6".to_string(),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| RelayError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}
