//! CLI glue for year-progress: argument parsing, configuration, client setup
//! and the single publish run.
//!
//! All computation and rendering lives in [`year-progress-core`]; this module
//! only wires the Bluesky client and the banner font into the core pipeline.
//!
//! The program takes no options: every invocation runs the same sequence
//! (log in → load font → publish). Schedule it externally to post periodically.
//!
//! [`year-progress-core`]: ../../year-progress-core/

use crate::bluesky::BlueskyClient;
use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::Parser;
use year_progress_core::banner::BannerRenderer;
use year_progress_core::publish::publish;

/// Post the UTC year progress as a text bar and refresh the profile banner.
#[derive(Parser, Debug)]
#[clap(
    name = "year-progress",
    version,
    about = "Post how much of the year (UTC) has elapsed and update the profile banner"
)]
pub struct Cli {}

/// Async entrypoint shared by main() and integration tests.
pub async fn run(_cli: Cli) -> Result<()> {
    tracing::info!("run_started");

    let config = load_config().context("Failed to load configuration")?;

    let client = BlueskyClient::login(&config.service, &config.handle, &config.password)
        .await
        .context("Failed to log in")?;

    let renderer = BannerRenderer::from_path(&config.font_path)
        .context("Failed to load the banner font")?;

    let now = chrono::Utc::now();
    match publish(&client, &renderer, now).await {
        Ok(report) => {
            tracing::info!(
                progress = report.progress,
                text = %report.text,
                banner_bytes = report.banner_bytes,
                post_uri = %report.post.uri,
                "Publish complete"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Publish failed");
            Err(anyhow::Error::new(e))
        }
    }
}
