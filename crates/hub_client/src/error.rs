//! Error type for hub operations.
//!
//! Every public operation fails with exactly one [`HubError`]. Branch on
//! [`HubError::kind`]; the display text is for humans.

use iothub_protocol::{PayloadKind, UrlBuildError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    /// Signature or URL could not be produced, or the hub handed back an
    /// unusable upload location.
    #[error("Cannot build request: {0}")]
    UrlConstructionFailed(String),

    /// JSON payload given to the large path, or bytes to the small path.
    #[error("Wrong payload for {operation}: expected {expected}")]
    WrongPayloadKind {
        operation: &'static str,
        expected: PayloadKind,
    },

    /// Request body or headers could not be encoded.
    #[error("Cannot serialize request: {0}")]
    SerializationFailed(String),

    #[error("Transport failure: {0}")]
    TransportFailure(#[from] TransportError),

    #[error("{0} response body is empty")]
    EmptyResponseBody(&'static str),

    /// Response body or a protocol header did not match what the hub
    /// promises.
    #[error("Cannot decode {what}: {source}")]
    DecodeFailure {
        what: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The blob store answered the upload with something other than 201.
    #[error("Large object upload rejected with HTTP {status}")]
    UploadRejected { status: u16, body: String },

    /// The upload succeeded but the hub did not confirm the message.
    #[error("Confirm of message {id} failed: {source}")]
    ConfirmFailed {
        id: String,
        #[source]
        source: Box<HubError>,
    },
}

/// Underlying network or HTTP failure.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Fieldless discriminant of [`HubError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UrlConstructionFailed,
    WrongPayloadKind,
    SerializationFailed,
    TransportFailure,
    EmptyResponseBody,
    DecodeFailure,
    UploadRejected,
    ConfirmFailed,
}

impl HubError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HubError::UrlConstructionFailed(_) => ErrorKind::UrlConstructionFailed,
            HubError::WrongPayloadKind { .. } => ErrorKind::WrongPayloadKind,
            HubError::SerializationFailed(_) => ErrorKind::SerializationFailed,
            HubError::TransportFailure(_) => ErrorKind::TransportFailure,
            HubError::EmptyResponseBody(_) => ErrorKind::EmptyResponseBody,
            HubError::DecodeFailure { .. } => ErrorKind::DecodeFailure,
            HubError::UploadRejected { .. } => ErrorKind::UploadRejected,
            HubError::ConfirmFailed { .. } => ErrorKind::ConfirmFailed,
        }
    }

    /// HTTP status of the failing response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            HubError::TransportFailure(TransportError::Status { status, .. }) => Some(*status),
            HubError::TransportFailure(TransportError::Network(e)) => e.status().map(|s| s.as_u16()),
            HubError::UploadRejected { status, .. } => Some(*status),
            HubError::ConfirmFailed { source, .. } => source.status(),
            _ => None,
        }
    }
}

impl From<UrlBuildError> for HubError {
    fn from(e: UrlBuildError) -> Self {
        HubError::UrlConstructionFailed(e.to_string())
    }
}

impl From<reqwest::Error> for HubError {
    fn from(e: reqwest::Error) -> Self {
        HubError::TransportFailure(TransportError::Network(e))
    }
}
