//! Glacier Restore Tool
//!
//! Restores S3 objects from Glacier / Deep Archive, with cost estimates,
//! a report-only mode, and optional waiting until restores complete.

// glrestore/src/main.rs
mod classify;
mod config;
mod cost;
mod errors;
mod resolve;
mod restore;
mod store;
mod utils;

use anyhow::{Context, Result};
use config::AppConfig;
use restore::logic::RunOutcome;
use std::process::ExitCode;
use store::s3::S3Store;
use tracing_subscriber::EnvFilter;

/// Main entry point for the restore tool
#[tokio::main]
async fn main() -> ExitCode {
    match run_app().await {
        Ok(_) => {
            println!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    let app_config = AppConfig::from_env_and_args().context("Failed to load configuration")?;

    // RUST_LOG wins over --debug.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(app_config.log_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!("Starting glrestore with config: {:?}", app_config);

    let store = S3Store::connect(&app_config.store).await;
    match restore::run_restore_flow(&app_config, &store).await? {
        RunOutcome::Reported { rows } => {
            tracing::info!("Report contains {} object(s)", rows);
        }
        RunOutcome::Restored { summary, polls } => {
            for (location, reason) in &summary.failed {
                eprintln!("⚠️ Restore not requested for {}: {}", location, reason);
            }
            if let Some(polls) = polls {
                tracing::info!("Waited through {} status poll(s)", polls);
            }
        }
    }
    Ok(())
}
