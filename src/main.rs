mod cli;
mod mmcp;
mod model;
#[cfg(feature = "tui")]
mod orchestrator;
mod presets;
mod probe;
mod registry;
mod storage;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn setup_logging() {
    // DEBUG=1 is the long-standing switch for troubleshooting terminal detection
    let default = if std::env::var_os("DEBUG").is_some() {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() {
    setup_logging();
    let args = cli::Cli::parse();

    if let Err(e) = cli::run(args).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
