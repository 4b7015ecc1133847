//! # contract: seams between the publish pipeline and its collaborators
//!
//! The pipeline needs two things it does not implement itself:
//! - a [`SocialClient`] that talks to the social network (blob upload,
//!   profile record read/write, post creation) on behalf of a logged-in account;
//! - an [`ImageRenderer`] that turns a percentage into PNG bytes.
//!
//! Both traits are annotated for `mockall`, so the pipeline can be exercised
//! without a network or a font file. Authentication happens when a concrete
//! client is constructed; the trait methods all act as that account.
//!
//! Profile writes are compare-and-swap: [`SocialClient::put_profile`] carries
//! the CID read by [`SocialClient::get_profile`] and the server rejects the
//! write with [`ClientError::SwapRejected`] if the record changed in between.

use std::fmt;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::banner::RenderError;

/// Opaque reference to an uploaded blob, embedded as-is into records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(pub serde_json::Value);

/// Current profile record with the CID that guards the next write.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    /// `None` when the account has no profile record yet.
    pub cid: Option<String>,
    pub value: serde_json::Value,
}

/// Reference to a created post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRef {
    pub uri: String,
    pub cid: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Login rejected, credentials missing or session no longer valid.
    Auth(String),
    /// The record changed between read and write.
    SwapRejected(String),
    /// Any other error response from the server.
    Api {
        status: u16,
        error: String,
        message: String,
    },
    /// Request never completed (DNS, TLS, connection reset...).
    Transport(String),
    /// Response body did not have the expected shape.
    Decode(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Auth(msg) => write!(f, "authentication failed: {}", msg),
            ClientError::SwapRejected(msg) => {
                write!(f, "record changed concurrently, write rejected: {}", msg)
            }
            ClientError::Api {
                status,
                error,
                message,
            } => write!(f, "API error {} ({}): {}", status, error, message),
            ClientError::Transport(msg) => write!(f, "transport error: {}", msg),
            ClientError::Decode(msg) => write!(f, "unexpected response: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

/// Social network operations needed to publish, for one authenticated account.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SocialClient: Send + Sync {
    /// Upload raw bytes, returning a reference usable inside records.
    async fn upload_blob(&self, bytes: Vec<u8>, mime_type: &str) -> Result<BlobRef, ClientError>;

    /// Read the account's profile record.
    async fn get_profile(&self) -> Result<ProfileRecord, ClientError>;

    /// Replace the profile record. `swap_record` is the CID from the read;
    /// `None` asserts that no record exists yet.
    async fn put_profile(
        &self,
        record: serde_json::Value,
        swap_record: Option<String>,
    ) -> Result<(), ClientError>;

    /// Create a plain-text post.
    async fn create_post(&self, text: &str) -> Result<PostRef, ClientError>;
}

/// Renders the banner for a percentage as PNG bytes.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait ImageRenderer: Send + Sync {
    fn render_png(&self, progress: f64) -> Result<Vec<u8>, RenderError>;
}
