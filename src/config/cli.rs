use crate::adapters::{StdoutOpener, SystemOpener};
use crate::app::capture::CapturePolicy;
use crate::domain::model::{ResultMapping, ResultValue};
use crate::domain::ports::UriOpener;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::sync::Arc;

#[derive(Debug, Clone, Parser)]
#[command(name = "lead-relay")]
#[command(about = "Capture calculator leads and relay them to email or CRM")]
pub struct CliConfig {
    #[arg(long, default_value = "lead-relay.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate input, dispatch the lead and report the outcome
    Submit(SubmitArgs),
    /// Print the capture form view as JSON
    Render(RenderArgs),
    /// Load and validate the configuration file
    CheckConfig,
}

#[derive(Debug, Clone, Args)]
pub struct SubmitArgs {
    #[arg(long)]
    pub calculator: String,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone: Option<String>,

    /// Repeatable LABEL=VALUE pair
    #[arg(long = "result", value_parser = parse_result_pair)]
    pub results: Vec<(String, ResultValue)>,

    #[arg(long, default_value = "")]
    pub source_url: String,

    #[arg(long, value_enum, default_value_t = PolicyArg::Email)]
    pub policy: PolicyArg,

    /// Open the mailto fallback in the desktop mail client instead of printing it
    #[arg(long)]
    pub open: bool,
}

impl SubmitArgs {
    pub fn opener(&self) -> Arc<dyn UriOpener> {
        if self.open {
            Arc::new(SystemOpener::default())
        } else {
            Arc::new(StdoutOpener)
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    #[arg(long)]
    pub calculator: String,

    #[arg(long = "result", value_parser = parse_result_pair)]
    pub results: Vec<(String, ResultValue)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Email,
    Crm,
}

impl From<PolicyArg> for CapturePolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Email => CapturePolicy::EmailWithMailto,
            PolicyArg::Crm => CapturePolicy::CrmOnly,
        }
    }
}

pub fn results_from_pairs(pairs: &[(String, ResultValue)]) -> ResultMapping {
    pairs.iter().cloned().collect()
}

/// Integers and plain decimals become numbers; anything else stays text.
pub fn parse_result_pair(raw: &str) -> Result<(String, ResultValue), String> {
    let (label, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=VALUE, got '{}'", raw))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(format!("empty label in '{}'", raw));
    }

    let value = value.trim();
    let parsed = match (value.parse::<i64>(), value.parse::<f64>()) {
        (Ok(n), _) => ResultValue::from(n),
        (_, Ok(f)) if f.is_finite() => ResultValue::from(f),
        _ => ResultValue::from(value),
    };

    Ok((label.to_string(), parsed))
}
