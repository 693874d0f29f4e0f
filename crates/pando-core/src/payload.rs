//! Ingestion payload: the record a producer sends for one event.
//!
//! On the wire a payload is a JSON object:
//!
//! ```json
//! {"channel": "billing:worker", "what": ["charge failed", {"id": 42}]}
//! ```
//!
//! `what` fragments are joined with a single space before normalisation.
//! String fragments are used verbatim; anything else is rendered with
//! [`render_value`](crate::normalizer::render_value).

use crate::error::{Error, Result};
use crate::normalizer::render_value;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub channel: String,
    pub what: Vec<Value>,
}

impl Payload {
    /// Build a payload from text fragments.
    pub fn new<I, S>(channel: impl Into<String>, what: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            channel: channel.into(),
            what: what.into_iter().map(|s| Value::String(s.into())).collect(),
        }
    }

    /// Decode a datagram. Rejects non-objects, a missing or blank `channel`,
    /// and a missing `what`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| Error::MalformedPayload(format!("not JSON: {e}")))?;
        if !value.is_object() {
            return Err(Error::MalformedPayload("payload is not an object".to_string()));
        }
        let payload: Payload = serde_json::from_value(value)
            .map_err(|e| Error::MalformedPayload(e.to_string()))?;
        if payload.channel.trim().is_empty() {
            return Err(Error::MalformedPayload("channel is empty".to_string()));
        }
        Ok(payload)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// The fragments joined with a single space.
    pub fn text(&self) -> String {
        self.what.iter().map(render_value).collect::<Vec<_>>().join(" ")
    }
}
