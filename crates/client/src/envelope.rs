//! JSON control envelopes for the gateway session.
//!
//! The `payload` field uses `serde_json::value::RawValue` so a reply can
//! be routed by id before its payload shape is known.

use serde::{Deserialize, Serialize};

/// Envelope for all text-frame control traffic.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope {
    pub id: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Box<serde_json::value::RawValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn new<T: Serialize>(
        id: impl Into<String>,
        msg_type: impl Into<String>,
        payload: Option<&T>,
    ) -> Result<Self, serde_json::Error> {
        let raw = payload
            .map(|p| serde_json::value::to_raw_value(p))
            .transpose()?;
        Ok(Self {
            id: id.into(),
            msg_type: msg_type.into(),
            payload: raw,
            error: None,
        })
    }

    /// Deserializes the payload into the given type.
    pub fn parse_payload<T: for<'de> Deserialize<'de>>(
        &self,
    ) -> Result<Option<T>, serde_json::Error> {
        self.payload
            .as_deref()
            .map(|raw| serde_json::from_str(raw.get()))
            .transpose()
    }
}
