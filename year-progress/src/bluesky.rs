#![doc = "Bluesky client: implements the core SocialClient trait over AT Protocol XRPC calls."]
//
//! # Bluesky integration (CLI <-> Core)
//!
//! [`BlueskyClient`] logs in with a handle and password
//! (`com.atproto.server.createSession`) and then acts as that account:
//!
//! - `upload_blob`  → `com.atproto.repo.uploadBlob`
//! - `get_profile`  → `com.atproto.repo.getRecord` (`app.bsky.actor.profile`, rkey `self`)
//! - `put_profile`  → `com.atproto.repo.putRecord` with `swapRecord`
//! - `create_post`  → `com.atproto.repo.createRecord` (`app.bsky.feed.post`)
//!
//! XRPC error bodies (`{"error": ..., "message": ...}`) are mapped onto
//! [`ClientError`]; `InvalidSwap` becomes [`ClientError::SwapRejected`].
//! No retries: the first failure is returned to the caller.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use year_progress_core::contract::{BlobRef, ClientError, PostRef, ProfileRecord, SocialClient};
use year_progress_core::publish::PROFILE_RECORD_TYPE;

const POST_RECORD_TYPE: &str = "app.bsky.feed.post";
const PROFILE_RKEY: &str = "self";
const POST_LANGS: &[&str] = &["en"];

const AUTH_ERRORS: &[&str] = &[
    "AuthenticationRequired",
    "AuthFactorTokenRequired",
    "AccountTakedown",
    "ExpiredToken",
    "InvalidToken",
];

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
    did: String,
    handle: String,
}

#[derive(Deserialize)]
struct UploadBlobResponse {
    blob: BlobRef,
}

#[derive(Deserialize)]
struct GetRecordResponse {
    cid: Option<String>,
    value: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PutRecordRequest<'a> {
    repo: &'a str,
    collection: &'a str,
    rkey: &'a str,
    record: Value,
    swap_record: Option<String>,
}

#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    repo: &'a str,
    collection: &'a str,
    record: Value,
}

#[derive(Deserialize, Default)]
struct XrpcErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct BlueskyClient {
    http: reqwest::Client,
    service: String,
    access_jwt: String,
    did: String,
}

impl BlueskyClient {
    /// Open a session for `identifier` on `service` (e.g. `https://bsky.social`).
    pub async fn login(
        service: &str,
        identifier: &str,
        password: &str,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::new();
        let service = service.trim_end_matches('/').to_string();
        tracing::info!(service = %service, identifier, "Creating session");

        let response = http
            .post(xrpc_url(&service, "com.atproto.server.createSession"))
            .json(&CreateSessionRequest {
                identifier,
                password,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let session: Session = decode(check(response).await.map_err(login_error)?).await?;

        tracing::info!(did = %session.did, handle = %session.handle, "Session created");
        Ok(Self {
            http,
            service,
            access_jwt: session.access_jwt,
            did: session.did,
        })
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    fn url(&self, nsid: &str) -> String {
        xrpc_url(&self.service, nsid)
    }
}

#[async_trait]
impl SocialClient for BlueskyClient {
    async fn upload_blob(&self, bytes: Vec<u8>, mime_type: &str) -> Result<BlobRef, ClientError> {
        tracing::info!(bytes = bytes.len(), mime_type, "Uploading blob");
        let response = self
            .http
            .post(self.url("com.atproto.repo.uploadBlob"))
            .bearer_auth(&self.access_jwt)
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(bytes)
            .send()
            .await
            .map_err(transport_error)?;
        let uploaded: UploadBlobResponse = decode(check(response).await?).await?;
        tracing::info!(blob = ?uploaded.blob, "Blob uploaded");
        Ok(uploaded.blob)
    }

    async fn get_profile(&self) -> Result<ProfileRecord, ClientError> {
        tracing::info!(did = %self.did, "Fetching profile record");
        let response = self
            .http
            .get(self.url("com.atproto.repo.getRecord"))
            .bearer_auth(&self.access_jwt)
            .query(&[
                ("repo", self.did.as_str()),
                ("collection", PROFILE_RECORD_TYPE),
                ("rkey", PROFILE_RKEY),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        match check(response).await {
            Ok(resp) => {
                let record: GetRecordResponse = decode(resp).await?;
                tracing::info!(cid = ?record.cid, "Fetched profile record");
                Ok(ProfileRecord {
                    cid: record.cid,
                    value: record.value,
                })
            }
            Err(e) => missing_profile(e),
        }
    }

    async fn put_profile(
        &self,
        record: Value,
        swap_record: Option<String>,
    ) -> Result<(), ClientError> {
        tracing::info!(did = %self.did, swap_record = ?swap_record, "Writing profile record");
        let body = PutRecordRequest {
            repo: &self.did,
            collection: PROFILE_RECORD_TYPE,
            rkey: PROFILE_RKEY,
            record,
            swap_record,
        };
        let response = self
            .http
            .post(self.url("com.atproto.repo.putRecord"))
            .bearer_auth(&self.access_jwt)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        check(response).await?;
        tracing::info!("Profile record written");
        Ok(())
    }

    async fn create_post(&self, text: &str) -> Result<PostRef, ClientError> {
        tracing::info!(did = %self.did, text, "Creating post");
        let body = CreateRecordRequest {
            repo: &self.did,
            collection: POST_RECORD_TYPE,
            record: post_record(text, &Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        };
        let response = self
            .http
            .post(self.url("com.atproto.repo.createRecord"))
            .bearer_auth(&self.access_jwt)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let post: PostRef = decode(check(response).await?).await?;
        tracing::info!(uri = %post.uri, cid = %post.cid, "Post created");
        Ok(post)
    }
}

fn xrpc_url(service: &str, nsid: &str) -> String {
    format!("{service}/xrpc/{nsid}")
}

fn post_record(text: &str, created_at: &str) -> Value {
    json!({
        "$type": POST_RECORD_TYPE,
        "text": text,
        "langs": POST_LANGS,
        "createdAt": created_at,
    })
}

/// Any rejection of the login itself is an authentication failure.
fn login_error(err: ClientError) -> ClientError {
    match err {
        ClientError::Api { error, message, .. } => {
            tracing::error!(error = %error, "Login rejected");
            ClientError::Auth(format!("{error}: {message}"))
        }
        other => other,
    }
}

/// An account that never saved a profile gets an empty one with no CID,
/// so the following write must create the record rather than replace it.
fn missing_profile(err: ClientError) -> Result<ProfileRecord, ClientError> {
    match err {
        ClientError::Api { error, .. } if error == "RecordNotFound" => {
            tracing::info!("No profile record yet, starting from an empty one");
            Ok(ProfileRecord {
                cid: None,
                value: json!({ "$type": PROFILE_RECORD_TYPE }),
            })
        }
        other => Err(other),
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    tracing::error!(error = ?e, "XRPC request failed");
    ClientError::Transport(e.to_string())
}

/// Pass successful responses through, turn error responses into a [`ClientError`].
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let err = classify_error(status, &body);
    tracing::error!(status = %status, error = %err, "XRPC call returned an error");
    Err(err)
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let body = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(error = %e, "Unexpected XRPC response body");
        ClientError::Decode(e.to_string())
    })
}

fn classify_error(status: StatusCode, body: &str) -> ClientError {
    let parsed: XrpcErrorBody = serde_json::from_str(body).unwrap_or_default();
    let error = parsed
        .error
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
    let message = parsed.message.unwrap_or_else(|| body.to_string());

    if error == "InvalidSwap" {
        ClientError::SwapRejected(message)
    } else if status == StatusCode::UNAUTHORIZED || AUTH_ERRORS.contains(&error.as_str()) {
        ClientError::Auth(format!("{error}: {message}"))
    } else {
        ClientError::Api {
            status: status.as_u16(),
            error,
            message,
        }
    }
}
