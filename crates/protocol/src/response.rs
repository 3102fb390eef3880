//! Hub response bodies.

use serde::{Deserialize, Serialize};

use crate::metadata::Metadata;

/// A stored message as the hub reports it.
///
/// Keys are PascalCase on the wire. `Lenght` is the hub's own spelling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishResponse {
    /// Presigned upload URL. Only set on the create step of a large publish.
    #[serde(rename = "Path")]
    pub path: Option<String>,
    #[serde(rename = "Topic")]
    pub topic: Option<String>,
    #[serde(rename = "Metadata")]
    pub metadata: Option<Metadata>,
    /// Content hash as recorded by the hub.
    #[serde(rename = "Hash")]
    pub hash: Option<String>,
    #[serde(rename = "Lenght", alias = "Length")]
    pub length: Option<u64>,
    #[serde(rename = "Id")]
    pub id: Option<String>,
    /// Server timestamp in ticks.
    #[serde(rename = "Ticks")]
    pub ticks: Option<f64>,
}

/// One page of the confirmed-message feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPage {
    /// Messages in ascending insertion order.
    pub messages: Vec<PublishResponse>,
    /// Cursor for the next page; `None` means the end of the feed in this
    /// direction.
    pub next_token: Option<String>,
}

impl FeedPage {
    pub fn is_last(&self) -> bool {
        self.next_token.is_none()
    }
}
