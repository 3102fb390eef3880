//! Message metadata and its `s-m-*` transport headers.
//!
//! The same record comes back from the hub inside every PublishResponse,
//! with the server-side fields (`ip`, `mt`) filled in.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentInfo;
use crate::message::{Coordinate, Message};
use crate::time::format_hub_timestamp;

/// Message metadata. Field names are the hub's short keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Event id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eid: Option<String>,
    /// Device id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    /// User id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Correlation token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<String>,
    /// Entity id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Operation: `c`, `u` or `d`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cud: Option<String>,
    /// Device model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub m: Option<String>,
    /// Serial number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osv: Option<String>,
    /// App name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub an: Option<String>,
    /// App version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub av: Option<String>,
    /// Local event time, no zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<String>,
    /// UTC offset in whole hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    /// `on;<lat>,<lon>` or `off`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<String>,
    /// Language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<String>,
    /// Network status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    /// Client address, filled by the hub.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Message type, filled by the hub.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mt: Option<String>,
}

impl Metadata {
    /// Combine message fields with an environment snapshot. Message values
    /// win where both supply one.
    pub fn derive(message: &Message, env: &EnvironmentInfo) -> Self {
        Self {
            eid: message.event_id.clone(),
            did: env.device_id.clone(),
            uid: message.user_id.clone(),
            ct: message.correlation_token.clone(),
            id: message.entity_id.clone(),
            cud: message.operation.map(|op| op.code().to_string()),
            m: env.device_model.clone(),
            sn: env.serial_number.clone(),
            os: env.os_name.clone(),
            osv: env.os_version.clone(),
            an: env.app_name.clone(),
            av: env.app_version.clone(),
            lt: message.created.map(|t| local_time(t, env.utc_offset_secs)),
            tz: env.utc_offset_secs.map(|secs| (secs / 3600).to_string()),
            geo: Some(geo_string(message.coordinate)),
            lng: message.language.clone().or_else(|| env.language.clone()),
            ns: message.network_status.clone().or_else(|| env.network_status.clone()),
            ip: None,
            mt: None,
        }
    }

    /// Header name/value pairs in transmission order, transliterated to
    /// ASCII. Fields without a value are left out.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let fields = [
            ("s-m-eid", &self.eid),
            ("s-m-did", &self.did),
            ("s-m-uid", &self.uid),
            ("s-m-ct", &self.ct),
            ("s-m-id", &self.id),
            ("s-m-cud", &self.cud),
            ("s-m-m", &self.m),
            ("s-m-sn", &self.sn),
            ("s-m-os", &self.os),
            ("s-m-osv", &self.osv),
            ("s-m-an", &self.an),
            ("s-m-av", &self.av),
            ("s-m-lt", &self.lt),
            ("s-m-tz", &self.tz),
            ("s-m-geo", &self.geo),
            ("s-m-lng", &self.lng),
            ("s-m-ns", &self.ns),
        ];
        fields
            .into_iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (name, transliterate(v))))
            .collect()
    }
}

/// Event time on the device clock, so `lt` and `tz` agree. Falls back to
/// the timestamp's own offset when the device offset is unknown.
fn local_time(created: DateTime<FixedOffset>, utc_offset_secs: Option<i32>) -> String {
    let local = match utc_offset_secs.and_then(FixedOffset::east_opt) {
        Some(offset) => created.with_timezone(&offset),
        None => created,
    };
    format_hub_timestamp(local.naive_local())
}

fn geo_string(coordinate: Option<Coordinate>) -> String {
    match coordinate {
        Some(c) => format!("on;{},{}", c.latitude, c.longitude),
        None => "off".to_string(),
    }
}

/// Latin transliteration with diacritics stripped, control characters
/// dropped. The result is always a legal header value.
pub fn transliterate(value: &str) -> String {
    deunicode::deunicode(value)
        .chars()
        .filter(|c| !c.is_ascii_control())
        .collect()
}
