//! `load_config` module: builds the runtime configuration from the process environment.
//!
//! There is no config file. Credentials come from the environment, usually
//! populated from a local `.env` by `main` before this runs.
//!
//! # Variables
//! - `HANDLE`: account handle or identifier used to log in (required)
//! - `PASSWORD`: account (app) password (required)
//! - `BSKY_SERVICE`: XRPC service base URL, defaults to [`DEFAULT_SERVICE`]
//! - `FONT_PATH`: banner font, defaults to `pacifico.ttf` next to the executable
//!
//! # Errors
//! A missing credential is an authentication failure and aborts the run
//! before anything is rendered or posted.
use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info};
use year_progress_core::banner::default_font_path;

pub const DEFAULT_SERVICE: &str = "https://bsky.social";

pub struct AppConfig {
    pub handle: String,
    pub password: String,
    pub service: String,
    pub font_path: PathBuf,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("handle", &self.handle)
            .field("password", &"<redacted>")
            .field("service", &self.service)
            .field("font_path", &self.font_path)
            .finish()
    }
}

impl AppConfig {
    pub fn trace_loaded(&self) {
        info!(
            handle = %self.handle,
            service = %self.service,
            font_path = %self.font_path.display(),
            "Loaded configuration"
        );
    }
}

pub fn load_config() -> Result<AppConfig> {
    let handle = required_var("HANDLE")?;
    let password = required_var("PASSWORD")?;

    let service = match std::env::var("BSKY_SERVICE") {
        Ok(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
        _ => DEFAULT_SERVICE.to_string(),
    };

    let font_path = match std::env::var_os("FONT_PATH") {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => default_font_path().context("Failed to locate the executable to resolve the font path")?,
    };

    let config = AppConfig {
        handle,
        password,
        service,
        font_path,
    };
    config.trace_loaded();
    Ok(config)
}

fn required_var(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) => {
            error!(var = name, "Environment variable is empty");
            Err(anyhow::anyhow!("{name} environment variable is empty"))
        }
        Err(e) => {
            error!(error = ?e, var = name, "Environment variable not set");
            Err(anyhow::anyhow!("{name} environment variable not set: {e}"))
        }
    }
}
