//! IoT hub HTTP client.
//!
//! Async reqwest client. Each call signs its own URL, so one client can be
//! shared across concurrent tasks. Nothing is retried: every failure is
//! returned to the caller.
//!
//! Large publish is strictly sequential: create → upload → confirm.

use std::sync::Arc;

use iothub_protocol::{
    format_hash_header, Credentials, Endpoint, EnvironmentProvider, FeedDirection, FeedPage,
    Message, Metadata, Payload, PayloadKind, PublishResponse, RequestUrlFactory,
    SystemEnvironment, BLOB_TYPE, BLOB_TYPE_HEADER, HASH_HEADER,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{HubError, TransportError};
use crate::feed::FeedPager;

/// Response header carrying the feed continuation token.
pub const CURSOR_HEADER: &str = "cursor-position";

const JSON: &str = "application/json";

/// IoT hub API client (async).
#[derive(Clone)]
pub struct HubClient {
    http: reqwest::Client,
    credentials: Arc<Credentials>,
    environment: Arc<dyn EnvironmentProvider>,
    config: ClientConfig,
}

impl std::fmt::Debug for HubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubClient")
            .field("credentials", &self.credentials)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HubClient {
    /// Create a client with default settings and the portable environment.
    pub fn new(credentials: Credentials) -> Result<Self, HubError> {
        Self::with_config(credentials, ClientConfig::default(), SystemEnvironment::new())
    }

    /// Create a client with explicit settings and environment provider.
    pub fn with_config(
        credentials: Credentials,
        config: ClientConfig,
        environment: impl EnvironmentProvider + 'static,
    ) -> Result<Self, HubError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            credentials: Arc::new(credentials),
            environment: Arc::new(environment),
            config,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, endpoint: Endpoint<'_>) -> Result<Url, HubError> {
        Ok(RequestUrlFactory::new(&self.credentials).build(endpoint)?)
    }

    // ── Publish ─────────────────────────────────────────────────────

    /// Publish a message, picking the protocol from its payload.
    pub async fn publish(&self, message: &Message) -> Result<PublishResponse, HubError> {
        match message.payload {
            Payload::Json(_) => self.publish_small(message).await,
            Payload::Bytes(_) => self.publish_large(message).await,
        }
    }

    /// Publish a JSON message in a single request.
    pub async fn publish_small(&self, message: &Message) -> Result<PublishResponse, HubError> {
        let Payload::Json(body) = &message.payload else {
            return Err(HubError::WrongPayloadKind {
                operation: "publish_small",
                expected: PayloadKind::Json,
            });
        };

        let url = self.url(Endpoint::Publish)?;
        let headers = self.metadata_headers(message)?;
        let body = serde_json::to_vec_pretty(body)
            .map_err(|e| HubError::SerializationFailed(e.to_string()))?;

        tracing::debug!(bytes = body.len(), "publishing small message");
        let resp = self
            .send(self.http.post(url).headers(headers).header(CONTENT_TYPE, JSON).body(body))
            .await?;
        let published: PublishResponse = decode(resp, "PublishResponse").await?;

        tracing::info!(id = published.id.as_deref().unwrap_or(""), "published small message");
        Ok(published)
    }

    /// Publish raw bytes: create a placeholder, upload the blob to the
    /// presigned path, then confirm.
    ///
    /// Nothing is rolled back on failure. The presigned path expires, so a
    /// caller retrying after an upload failure should call this again rather
    /// than reuse anything from the failed attempt.
    pub async fn publish_large(&self, message: &Message) -> Result<PublishResponse, HubError> {
        let Payload::Bytes(data) = &message.payload else {
            return Err(HubError::WrongPayloadKind {
                operation: "publish_large",
                expected: PayloadKind::Bytes,
            });
        };

        let (id, upload_url) = self.create_large(message).await?;
        self.upload_large(upload_url, data).await?;
        let confirmed = self
            .confirm_large(&id)
            .await
            .map_err(|e| HubError::ConfirmFailed { id: id.clone(), source: Box::new(e) })?;

        tracing::info!(%id, bytes = data.len(), "published large message");
        Ok(confirmed)
    }

    /// Step 1: empty-body publish. Returns the assigned id and upload URL.
    async fn create_large(&self, message: &Message) -> Result<(String, Url), HubError> {
        let url = self.url(Endpoint::Publish)?;
        let headers = self.metadata_headers(message)?;

        let resp = self
            .send(self.http.post(url).headers(headers).header(CONTENT_TYPE, JSON))
            .await?;
        let created: PublishResponse = decode(resp, "PublishResponse").await?;

        let id = created.id.filter(|id| !id.is_empty());
        let path = created.path.as_deref().and_then(|p| Url::parse(p).ok());
        match (id, path) {
            (Some(id), Some(path)) => {
                tracing::debug!(%id, "large message placeholder created");
                Ok((id, path))
            }
            _ => Err(HubError::UrlConstructionFailed(
                "create response lacks a message id or a valid upload path".into(),
            )),
        }
    }

    /// Step 2: PUT the blob. Only 201 Created counts as success.
    async fn upload_large(&self, url: Url, data: &[u8]) -> Result<(), HubError> {
        let hash = format_hash_header(data);
        let response = self
            .http
            .put(url)
            .header(BLOB_TYPE_HEADER, BLOB_TYPE)
            .header(HASH_HEADER, hash)
            .body(data.to_vec())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "large object upload rejected");
            return Err(HubError::UploadRejected { status: status.as_u16(), body });
        }

        tracing::debug!(bytes = data.len(), "large object uploaded");
        Ok(())
    }

    /// Step 3: make the uploaded message visible in the feed.
    async fn confirm_large(&self, id: &str) -> Result<PublishResponse, HubError> {
        let url = self.url(Endpoint::ConfirmLarge { id })?;
        let resp = self.send(self.http.put(url)).await;
        let result = match resp {
            Ok(resp) => decode(resp, "PublishResponse").await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            tracing::warn!(%id, error = %e, "confirm failed");
        }
        result
    }

    // ── Storage ─────────────────────────────────────────────────────

    /// Fetch a stored message by id.
    pub async fn get_message(&self, id: &str) -> Result<PublishResponse, HubError> {
        let url = self.url(Endpoint::Storage { id })?;
        let resp = self.send(self.http.get(url)).await?;
        decode(resp, "PublishResponse").await
    }

    /// Set a metadata field, creating it if absent.
    ///
    /// The body is the bare value string even though the content type is
    /// JSON; that is what the hub accepts.
    pub async fn update_meta(
        &self,
        id: &str,
        name: &str,
        value: &str,
    ) -> Result<PublishResponse, HubError> {
        let url = self.url(Endpoint::StorageMeta { id, name })?;
        let resp = self
            .send(self.http.put(url).header(CONTENT_TYPE, JSON).body(value.to_string()))
            .await?;
        decode(resp, "PublishResponse").await
    }

    /// Remove a metadata field. Removing a field that does not exist
    /// succeeds. Returns the updated message when the hub sends one back.
    pub async fn delete_meta(
        &self,
        id: &str,
        name: &str,
    ) -> Result<Option<PublishResponse>, HubError> {
        let url = self.url(Endpoint::StorageMeta { id, name })?;
        let resp = self.send(self.http.delete(url)).await?;
        let bytes = resp.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        decode_bytes(&bytes, "PublishResponse").map(Some)
    }

    // ── Feed ────────────────────────────────────────────────────────

    /// Fetch one feed page. `token: None` starts at the beginning of the feed.
    pub async fn get_feed(
        &self,
        token: Option<&str>,
        direction: FeedDirection,
        size: u32,
    ) -> Result<FeedPage, HubError> {
        let url = self.url(Endpoint::Feed { direction, size, token })?;
        let resp = self.send(self.http.get(url)).await?;

        let next_token = cursor_token(resp.headers())?;
        let messages: Vec<PublishResponse> = decode(resp, "feed page").await?;

        tracing::debug!(count = messages.len(), more = next_token.is_some(), %direction, "fetched feed page");
        Ok(FeedPage { messages, next_token })
    }

    /// Walk the feed page by page from `start_token`.
    pub fn feed_pager(
        &self,
        direction: FeedDirection,
        size: u32,
        start_token: Option<String>,
    ) -> FeedPager<'_> {
        FeedPager::new(self, direction, size, start_token)
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn metadata_headers(&self, message: &Message) -> Result<HeaderMap, HubError> {
        let metadata = Metadata::derive(message, &self.environment.snapshot());
        let mut headers = HeaderMap::new();
        for (name, value) in metadata.headers() {
            let value = HeaderValue::from_str(&value).map_err(|e| {
                HubError::SerializationFailed(format!("metadata header {}: {}", name, e))
            })?;
            headers.insert(HeaderName::from_static(name), value);
        }
        Ok(headers)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, HubError> {
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status: status.as_u16(), body }.into());
        }

        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    what: &'static str,
) -> Result<T, HubError> {
    let bytes = response.bytes().await?;
    decode_bytes(&bytes, what)
}

fn decode_bytes<T: DeserializeOwned>(bytes: &[u8], what: &'static str) -> Result<T, HubError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(HubError::EmptyResponseBody(what));
    }
    serde_json::from_slice(bytes)
        .map_err(|source| HubError::DecodeFailure { what, source: Box::new(source) })
}

/// Continuation token from the feed response. Absent or blank means the
/// feed is exhausted; an unreadable value is an error, not the end.
fn cursor_token(headers: &HeaderMap) -> Result<Option<String>, HubError> {
    let Some(value) = headers.get(CURSOR_HEADER) else {
        return Ok(None);
    };
    let token = value.to_str().map_err(|source| HubError::DecodeFailure {
        what: "cursor-position header",
        source: Box::new(source),
    })?;
    let token = token.trim();
    Ok((!token.is_empty()).then(|| token.to_string()))
}
