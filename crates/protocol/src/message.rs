//! Outgoing message model.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// What a message carries. The variant selects the publish protocol:
/// JSON goes in a single request, bytes go through the three-step upload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Json(_) => PayloadKind::Json,
            Payload::Bytes(_) => PayloadKind::Bytes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Json,
    Bytes,
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadKind::Json => f.write_str("JSON body"),
            PayloadKind::Bytes => f.write_str("raw bytes"),
        }
    }
}

/// Operation performed on the entity the message describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Create,
    Update,
    Delete,
}

impl OperationType {
    pub fn code(&self) -> &'static str {
        match self {
            OperationType::Create => "c",
            OperationType::Update => "u",
            OperationType::Delete => "d",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A logical event to publish.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Event type, e.g. `clm.session`.
    pub event_id: Option<String>,
    pub user_id: Option<String>,
    /// Id of the entity carried in the body, if it has one.
    pub entity_id: Option<String>,
    /// Shared by every event in one causal chain.
    pub correlation_token: Option<String>,
    pub operation: Option<OperationType>,
    /// How the device is connected (wifi, lan, ...).
    pub network_status: Option<String>,
    pub language: Option<String>,
    pub coordinate: Option<Coordinate>,
    /// When the event happened on the device.
    pub created: Option<DateTime<FixedOffset>>,
    pub payload: Payload,
}

impl Message {
    pub fn new(payload: Payload) -> Self {
        Self {
            event_id: None,
            user_id: None,
            entity_id: None,
            correlation_token: None,
            operation: None,
            network_status: None,
            language: None,
            coordinate: None,
            created: None,
            payload,
        }
    }

    pub fn json(body: serde_json::Value) -> Self {
        Self::new(Payload::Json(body))
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::new(Payload::Bytes(data.into()))
    }

    /// JSON message from any serializable body.
    pub fn serialize<T: Serialize + ?Sized>(body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::json(serde_json::to_value(body)?))
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_correlation_token(mut self, token: impl Into<String>) -> Self {
        self.correlation_token = Some(token.into());
        self
    }

    pub fn with_operation(mut self, operation: OperationType) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn with_network_status(mut self, status: impl Into<String>) -> Self {
        self.network_status = Some(status.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    pub fn with_created(mut self, created: DateTime<FixedOffset>) -> Self {
        self.created = Some(created);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_kind() {
        assert_eq!(Message::json(serde_json::json!({})).payload.kind(), PayloadKind::Json);
        assert_eq!(Message::bytes(vec![1, 2, 3]).payload.kind(), PayloadKind::Bytes);
    }

    #[test]
    fn test_serialize_body() {
        #[derive(Serialize)]
        struct Reading {
            sensor: &'static str,
            value: f64,
        }
        let msg = Message::serialize(&Reading { sensor: "t1", value: 21.5 }).unwrap();
        assert_eq!(msg.payload, Payload::Json(serde_json::json!({"sensor": "t1", "value": 21.5})));
    }

    #[test]
    fn test_builder_setters() {
        let msg = Message::json(serde_json::json!({"testKey": "testValue"}))
            .with_event_id("demo.test")
            .with_operation(OperationType::Update);
        assert_eq!(msg.event_id.as_deref(), Some("demo.test"));
        assert_eq!(msg.operation.map(|o| o.code()), Some("u"));
    }
}
