//! `ainews` entrypoint: one pipeline stage per invocation.
//!
//! Logs go to stderr; stdout carries the stage product.

use ainews_pipeline::cli::{self, Cli};
use ainews_pipeline::Settings;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Stage targets and the library at info, everything else at warn.
const DEFAULT_LOG_FILTER: &str =
    "fetch=info,translate=info,render=info,publish=info,site=info,notify=info,ainews_pipeline=info,warn";

/// `RUST_LOG` overrides [`DEFAULT_LOG_FILTER`]; `AINEWS_LOG_JSON=1` switches
/// to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("AINEWS_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env locally; no-op in CI.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let result = match Settings::load_default() {
        Ok(settings) => cli::run(cli, &settings).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "stage failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
