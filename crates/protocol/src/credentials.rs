//! Hub credentials and request expiration.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::time::format_utc;

/// Default lifetime of a signed request.
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(180);

/// Construction-time credential errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    #[error("credential string must have 4 or 5 '='-separated fields, found {0}")]
    FieldCount(usize),

    #[error("credential field '{0}' is empty")]
    EmptyField(&'static str),

    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("invalid expiration '{0}': expected a positive number of seconds")]
    InvalidExpiration(String),

    #[error("invalid key '{0}': only ASCII letters, digits, '-', '.', '_' and '~' are allowed")]
    InvalidKey(String),
}

/// Immutable credential set for one hub.
///
/// The secret is only ever used to key the request HMAC; it is never sent
/// and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    endpoint: String,
    hub: String,
    key: String,
    secret: String,
    expiration: Duration,
}

impl Credentials {
    pub fn new(
        endpoint: impl Into<String>,
        hub: impl Into<String>,
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, CredentialsError> {
        Self::with_expiration(endpoint, hub, key, secret, DEFAULT_EXPIRATION)
    }

    pub fn with_expiration(
        endpoint: impl Into<String>,
        hub: impl Into<String>,
        key: impl Into<String>,
        secret: impl Into<String>,
        expiration: Duration,
    ) -> Result<Self, CredentialsError> {
        let endpoint = endpoint.into().trim().trim_end_matches('/').to_string();
        let hub = hub.into().trim().to_string();
        let key = key.into().trim().to_string();
        let secret = secret.into();

        for (name, value) in [("endpoint", &endpoint), ("hub", &hub), ("key", &key), ("secret", &secret)] {
            if value.is_empty() {
                return Err(CredentialsError::EmptyField(name));
            }
        }

        // The key is sent verbatim in the query and signed as-is.
        if !key.bytes().all(is_unreserved) {
            return Err(CredentialsError::InvalidKey(key));
        }

        let parsed = Url::parse(&endpoint).map_err(|e| CredentialsError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(CredentialsError::InvalidEndpoint {
                endpoint,
                reason: "expected an http(s) base URL".into(),
            });
        }

        if expiration.is_zero() {
            return Err(CredentialsError::InvalidExpiration(format!("{:?}", expiration)));
        }

        Ok(Self { endpoint, hub, key, secret, expiration })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn hub(&self) -> &str {
        &self.hub
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn expiration_window(&self) -> Duration {
        self.expiration
    }

    /// Expiration timestamp for a request issued at `now`.
    pub fn expiration_at(&self, now: DateTime<Utc>) -> String {
        // Window is validated non-zero; clamp absurd values instead of overflowing.
        let window = chrono::Duration::from_std(self.expiration).unwrap_or(chrono::Duration::MAX);
        let expires = now.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC);
        format_utc(expires)
    }

    /// Expiration timestamp for a request issued now.
    pub fn expiration(&self) -> String {
        self.expiration_at(Utc::now())
    }
}

/// RFC 3986 unreserved characters.
fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint", &self.endpoint)
            .field("hub", &self.hub)
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Parses `endpoint=hub=key=secret[=expiration_secs]`.
impl FromStr for Credentials {
    type Err = CredentialsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = raw.trim().split('=').collect();
        match fields.as_slice() {
            [endpoint, hub, key, secret] => Self::new(*endpoint, *hub, *key, *secret),
            [endpoint, hub, key, secret, expiration] => {
                let secs: u64 = expiration
                    .trim()
                    .parse()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(|| CredentialsError::InvalidExpiration(expiration.to_string()))?;
                Self::with_expiration(*endpoint, *hub, *key, *secret, Duration::from_secs(secs))
            }
            other => Err(CredentialsError::FieldCount(other.len())),
        }
    }
}
