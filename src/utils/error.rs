use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("HTTP client error: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid input for '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("A submission is already in progress for this form")]
    SubmissionInProgress,

    #[error("No capture form is currently open")]
    NoActiveForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Input,
    State,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RelayError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        RelayError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RelayError::ApiError(_) => ErrorCategory::Network,
            RelayError::ConfigError { .. }
            | RelayError::ConfigValidationError { .. }
            | RelayError::InvalidConfigValueError { .. }
            | RelayError::MissingConfigError { .. } => ErrorCategory::Configuration,
            RelayError::ValidationError { .. } => ErrorCategory::Input,
            RelayError::SubmissionInProgress | RelayError::NoActiveForm => ErrorCategory::State,
            RelayError::IoError(_) | RelayError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::State => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            RelayError::ApiError(_) => {
                "Check network connectivity and the configured endpoint URLs".to_string()
            }
            RelayError::IoError(_) => "Check that the file exists and is readable".to_string(),
            RelayError::SerializationError(_) => {
                "Check that the data is valid JSON".to_string()
            }
            RelayError::ConfigError { .. } | RelayError::ConfigValidationError { .. } => {
                "Review the configuration file and fix the reported section".to_string()
            }
            RelayError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}' in the configuration file", field)
            }
            RelayError::MissingConfigError { field } => {
                format!("Add '{}' to the configuration file or environment", field)
            }
            RelayError::ValidationError { field, .. } => {
                format!("Fill in a valid value for '{}' and submit again", field)
            }
            RelayError::SubmissionInProgress => {
                "Wait for the current submission to finish".to_string()
            }
            RelayError::NoActiveForm => "Open the capture form before submitting".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RelayError::ValidationError { field, message } => {
                format!("Please check the field '{}': {}", field, message)
            }
            RelayError::ApiError(_) => "Could not reach the delivery service".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
