//! High-level pipeline: compute → render → update banner → post.
//!
//! One linear, fail-fast run per invocation:
//!   - computes the UTC year progress at the injected instant
//!   - renders the text bar and the PNG banner
//!   - uploads the banner and swaps it into the profile record ([`update_banner`])
//!   - posts the text bar
//!
//! The first failing step aborts the run; nothing is retried. A profile that
//! changed between read and write surfaces as [`ClientError::SwapRejected`]
//! wrapped in [`PublishError::Banner`], and no post is made.
//!
//! # Navigation
//! - Main entrypoint: [`publish`]
//! - Supporting types: [`PublishReport`], [`PublishError`]

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::banner::RenderError;
use crate::contract::{ClientError, ImageRenderer, PostRef, SocialClient};
use crate::progress::year_progress;
use crate::text_bar::{render_text_bar, DEFAULT_BAR_LENGTH};

pub const PROFILE_RECORD_TYPE: &str = "app.bsky.actor.profile";
pub const BANNER_MIME_TYPE: &str = "image/png";

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub progress: f64,
    pub text: String,
    pub banner_bytes: usize,
    pub post: PostRef,
}

#[derive(Debug)]
pub enum PublishError {
    Render(RenderError),
    Banner(ClientError),
    Post(ClientError),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Render(e) => write!(f, "banner rendering failed: {}", e),
            PublishError::Banner(e) => write!(f, "banner update failed: {}", e),
            PublishError::Post(e) => write!(f, "post creation failed: {}", e),
        }
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PublishError::Render(e) => Some(e),
            PublishError::Banner(e) | PublishError::Post(e) => Some(e),
        }
    }
}

pub async fn publish<C, R>(
    client: &C,
    renderer: &R,
    now: DateTime<Utc>,
) -> Result<PublishReport, PublishError>
where
    C: SocialClient,
    R: ImageRenderer,
{
    info!(now = %now, "[PUBLISH] Starting year progress run");

    let progress = year_progress(now);
    let text = render_text_bar(progress, DEFAULT_BAR_LENGTH);
    info!(progress, text = %text, "[PUBLISH] Computed progress");

    let png = renderer.render_png(progress).map_err(|e| {
        error!(error = %e, "[PUBLISH][ERROR] Banner rendering failed");
        PublishError::Render(e)
    })?;
    let banner_bytes = png.len();
    info!(bytes = banner_bytes, "[PUBLISH] Rendered banner");

    update_banner(client, png).await.map_err(|e| {
        error!(error = %e, "[PUBLISH][ERROR] Banner update failed");
        PublishError::Banner(e)
    })?;
    info!("[PUBLISH] Profile banner replaced");

    let post = client.create_post(&text).await.map_err(|e| {
        error!(error = %e, "[PUBLISH][ERROR] Post creation failed");
        PublishError::Post(e)
    })?;
    info!(uri = %post.uri, "[PUBLISH] Post created");

    Ok(PublishReport {
        progress,
        text,
        banner_bytes,
        post,
    })
}

/// Upload `png` and swap it into the profile, keeping every other field.
pub async fn update_banner<C>(client: &C, png: Vec<u8>) -> Result<(), ClientError>
where
    C: SocialClient,
{
    let blob = client.upload_blob(png, BANNER_MIME_TYPE).await?;
    debug!(blob = ?blob, "[BANNER] Uploaded blob");

    let current = client.get_profile().await?;
    debug!(cid = ?current.cid, "[BANNER] Fetched current profile");

    let record = with_banner(current.value, blob.0);
    client.put_profile(record, current.cid).await
}

fn with_banner(profile: Value, banner: Value) -> Value {
    let mut record = match profile {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    record.insert("$type".to_string(), Value::from(PROFILE_RECORD_TYPE));
    record.insert("banner".to_string(), banner);
    Value::Object(record)
}
