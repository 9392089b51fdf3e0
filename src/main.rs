use clap::Parser;
use lead_relay::app::presentation::{lock_surface, render_capture_form, UiState};
use lead_relay::config::cli::{results_from_pairs, Command, RenderArgs, SubmitArgs};
use lead_relay::config::toml_config::BrandingConfig;
use lead_relay::utils::error::ErrorSeverity;
use lead_relay::utils::{logger, validation::Validate};
use lead_relay::{CaptureSurface, CliConfig, ContactDetails, LeadCapture, RelayConfig, RelayError};
use std::path::Path;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let result = match &cli.command {
        Command::Submit(args) => run_submit(&cli.config, args).await,
        Command::Render(args) => run_render(&cli.config, args),
        Command::CheckConfig => load_config(&cli.config).and_then(|config| {
            println!(
                "✅ Configuration OK: channels {:?}, mailto fallback {}",
                config.channel_order()?,
                config.dispatch.mailto_fallback
            );
            Ok(0)
        }),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low | ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }
}

fn load_config(path: &str) -> Result<RelayConfig, RelayError> {
    let config = RelayConfig::from_file(path)?;
    config.validate()?;
    Ok(config)
}

async fn run_submit(config_path: &str, args: &SubmitArgs) -> Result<i32, RelayError> {
    let config = load_config(config_path)?;
    let capture = LeadCapture::from_config(&config, args.policy.into(), args.opener())?;

    let surface = CaptureSurface::shared(config.branding.clone());
    lock_surface(&surface).show(
        args.calculator.clone(),
        results_from_pairs(&args.results),
        Some(Box::new(|contact: ContactDetails| {
            tracing::info!("🙏 Thank you, {}", contact.name);
        })),
    );

    let contact = ContactDetails {
        name: args.name.clone(),
        email: args.email.clone(),
        phone: args.phone.clone(),
    };

    let result = capture.submit(&surface, contact, &args.source_url).await?;
    println!("{}", serde_json::to_string_pretty(&result.outcome)?);

    match result.ui_state {
        UiState::TryAgain => {
            eprintln!("❌ Verzenden mislukt. Probeer het opnieuw.");
            Ok(2)
        }
        state => {
            println!("✅ {:?}", state);
            Ok(0)
        }
    }
}

fn run_render(config_path: &str, args: &RenderArgs) -> Result<i32, RelayError> {
    let branding = if Path::new(config_path).exists() {
        load_config(config_path)?.branding
    } else {
        tracing::debug!("No config at {}, rendering with default branding", config_path);
        BrandingConfig::default()
    };

    let view = render_capture_form(
        &branding,
        &args.calculator,
        &results_from_pairs(&args.results),
        UiState::Editing,
    );
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(0)
}
