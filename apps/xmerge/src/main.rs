//! # xmerge - Deep Merge CLI
//!
//! The main binary for the xmerge document merge engine.
//!
//! This application provides:
//! - Left-to-right deep merge of JSON and TOML documents
//! - Loose and strict deep equality between documents
//! - Dotted-path get / set / merge-set
//! - Flattening documents to dotted keys
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │          apps/xmerge (THE BINARY)         │
//! │                                           │
//! │   ┌─────────────┐     ┌───────────────┐   │
//! │   │    CLI      │────▶│  file I/O     │   │
//! │   │   (clap)    │     │  JSON / TOML  │   │
//! │   └──────┬──────┘     └───────────────┘   │
//! │          ▼                                │
//! │  ┌───────────────┐                        │
//! │  │  xmerge-core  │                        │
//! │  │  (THE LOGIC)  │                        │
//! │  └───────────────┘                        │
//! └───────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! xmerge merge base.toml overlay.json -o merged.json
//! xmerge equals a.json b.json --strict
//! xmerge get config.json server.ports.0
//! xmerge set config.json server.tls '{"enabled": true}' --merge
//! xmerge flatten config.json
//! ```

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use xmerge::cli;

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    init_tracing(cli.verbose);

    match cli::execute(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing on stderr. XMERGE_LOG_FORMAT=json enables machine-parseable output.
fn init_tracing(verbose: bool) {
    let log_format = std::env::var("XMERGE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_level = if verbose { "xmerge=debug" } else { "xmerge=info" };
    let filter = EnvFilter::try_from_env("XMERGE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| default_level.into());

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
}
