//! # tenc - Tensor Archive Converter
//!
//! The main binary for converting multigraphs into adjacency tensor archives.
//!
//! ## Usage
//!
//! ```bash
//! # Convert tab-delimited triples into tensor.tz
//! tenc convert -f triples.tsv -n tensor
//!
//! # Restate the archive as Turtle, pruning rare entities
//! tenc serialize -a tensor.tz -t turtle --min-count-ent 2
//!
//! # Inspect
//! tenc status -a tensor.tz
//! tenc index -a tensor.tz -k predicates
//! ```
//!
//! Logs go to standard error; command output goes to standard output.

use clap::Parser;
use tenc::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing. TENC_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("TENC_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "tenc=debug,tenc_core=debug"
    } else {
        "tenc=info,tenc_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the tenc startup banner.
fn print_banner() {
    eprintln!(
        "tenc v{} - multigraph to adjacency tensor converter",
        env!("CARGO_PKG_VERSION")
    );
}
