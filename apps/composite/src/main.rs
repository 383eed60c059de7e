//! # Composite - Command Line Front-End
//!
//! Loads an assembly description, builds the composite graph through
//! `composite-core` and reports aggregates, roots and per-node state.
//!
//! ## Usage
//!
//! ```bash
//! composite check car.toml
//! composite sum car.toml -n camaro -k horsePower
//! composite roots car.toml -n superCharger --json-mode
//! composite show car.toml --config graph.toml
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // COMPOSITE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("COMPOSITE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "composite=info,composite_core=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if cli.verbose {
        tracing::info!(command = ?cli.command, "starting");
    }
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    eprintln!("composite v{}", env!("CARGO_PKG_VERSION"));
}
