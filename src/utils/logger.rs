use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn relay_filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "lead_relay=debug,info"
    } else {
        "lead_relay=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(relay_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr) // stdout carries the outcome and view JSON
                .compact(),
        )
        .init();
}

pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(relay_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr)
                .json(), // One object per line so a log shipper can parse submit runs
        )
        .init();
}
