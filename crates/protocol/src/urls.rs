//! Signed endpoint URLs.
//!
//! Every request URL has the shape
//!
//! ```text
//! {endpoint}/{hub}/{segments...}/?key={key}&expiration={expiration}&signature={signature}[&extra...]
//! ```
//!
//! The signature covers only `key` then `expiration`. Note the two joining
//! rules: the canonical signing string has no delimiter between pairs while
//! the query string uses `&`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded::byte_serialize;
use url::Url;

use crate::credentials::Credentials;
use crate::sign::SignatureBuilder;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlBuildError {
    #[error("request signature could not be computed")]
    SignatureUnavailable,

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

/// Feed traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedDirection {
    #[default]
    Forward,
    Backward,
}

impl FeedDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedDirection::Forward => "forward",
            FeedDirection::Backward => "backward",
        }
    }
}

impl std::fmt::Display for FeedDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The hub endpoints a client can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// `POST` small message, or `POST` empty body to start a large one.
    Publish,
    /// `PUT` after the blob upload to make a large message visible.
    ConfirmLarge { id: &'a str },
    /// `GET` a stored message.
    Storage { id: &'a str },
    /// `PUT` or `DELETE` one metadata field.
    StorageMeta { id: &'a str, name: &'a str },
    /// `GET` a page of confirmed messages.
    Feed { direction: FeedDirection, size: u32, token: Option<&'a str> },
}

impl Endpoint<'_> {
    fn segments(&self) -> Vec<&str> {
        match *self {
            Endpoint::Publish => vec!["publish"],
            Endpoint::ConfirmLarge { id } => vec!["publish", id, "confirm"],
            Endpoint::Storage { id } => vec!["storage", id],
            Endpoint::StorageMeta { id, name } => vec!["storage", id, "meta", name],
            Endpoint::Feed { .. } => vec!["feed"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Publish => "publish",
            Endpoint::ConfirmLarge { .. } => "confirm",
            Endpoint::Storage { .. } => "storage",
            Endpoint::StorageMeta { .. } => "storage meta",
            Endpoint::Feed { .. } => "feed",
        }
    }
}

/// Builds freshly signed URLs for one credential set.
#[derive(Debug, Clone, Copy)]
pub struct RequestUrlFactory<'a> {
    credentials: &'a Credentials,
}

impl<'a> RequestUrlFactory<'a> {
    pub fn new(credentials: &'a Credentials) -> Self {
        Self { credentials }
    }

    /// Signature over `key` and `expiration`, in that order.
    pub fn signature(&self, expiration: &str) -> Option<String> {
        let mut builder = SignatureBuilder::new(self.credentials.secret());
        builder
            .add("key", self.credentials.key())
            .add("expiration", expiration);
        builder.result_if_not_empty()
    }

    /// Build a URL with an expiration computed from the current time.
    pub fn build(&self, endpoint: Endpoint<'_>) -> Result<Url, UrlBuildError> {
        self.build_at(endpoint, Utc::now())
    }

    /// Build a URL as if issued at `now`.
    pub fn build_at(&self, endpoint: Endpoint<'_>, now: DateTime<Utc>) -> Result<Url, UrlBuildError> {
        let expiration = self.credentials.expiration_at(now);
        let signature = self
            .signature(&expiration)
            .ok_or(UrlBuildError::SignatureUnavailable)?;

        let mut url = Url::parse(self.credentials.endpoint())
            .map_err(|e| UrlBuildError::InvalidUrl(e.to_string()))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| UrlBuildError::InvalidUrl("endpoint cannot be a base URL".into()))?;
            path.pop_if_empty();
            path.push(self.credentials.hub());
            for segment in endpoint.segments() {
                if segment.is_empty() {
                    return Err(UrlBuildError::InvalidUrl(format!(
                        "empty path segment in {} URL",
                        endpoint.name()
                    )));
                }
                path.push(segment);
            }
            // Trailing slash before the query.
            path.push("");
        }

        let mut query = format!(
            "key={}&expiration={}&signature={}",
            self.credentials.key(),
            expiration,
            signature
        );
        if let Endpoint::Feed { direction, size, token } = endpoint {
            query.push_str(&format!("&direction={}&size={}", direction, size));
            if let Some(token) = token {
                query.push_str("&token=");
                query.extend(byte_serialize(token.as_bytes()));
            }
        }
        url.set_query(Some(&query));

        tracing::debug!(endpoint = endpoint.name(), path = url.path(), %expiration, "built signed url");
        Ok(url)
    }
}
