pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::{CapturePolicy, CaptureSurface, LeadCapture};
pub use config::RelayConfig;
pub use core::dispatcher::Dispatcher;
pub use domain::model::{
    ChannelKind, ContactDetails, DeliveryOutcome, ProviderResponse, ResultMapping, ResultValue,
    Submission,
};
pub use utils::error::{RelayError, Result};
