//! Trigger payloads: direct invocations and queue envelopes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use docmark_core::{Error, Result};

/// One stored file awaiting conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMessage {
    pub bucket: String,
    pub key: String,
    pub table: String,
}

impl TriggerMessage {
    fn check(self) -> Result<Self> {
        for (name, value) in [("bucket", &self.bucket), ("key", &self.key), ("table", &self.table)] {
            if value.trim().is_empty() {
                return Err(Error::BadRequest(format!("'{}' must not be empty", name)));
            }
        }
        Ok(self)
    }
}

/// One entry of a queue envelope's `Records` array.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub body: serde_json::Value,
}

impl QueueRecord {
    /// Decode the record body into a trigger message.
    ///
    /// Queues deliver the body as a JSON string; an already-decoded object is accepted too.
    pub fn message(&self) -> Result<TriggerMessage> {
        let message: TriggerMessage = match &self.body {
            serde_json::Value::String(raw) => serde_json::from_str(raw)
                .map_err(|e| Error::BadRequest(format!("record body is not a trigger message: {}", e)))?,
            serde_json::Value::Object(_) => serde_json::from_value(self.body.clone())
                .map_err(|e| Error::BadRequest(format!("record body is not a trigger message: {}", e)))?,
            serde_json::Value::Null => {
                return Err(Error::BadRequest("record has no 'body'".into()));
            }
            other => {
                return Err(Error::BadRequest(format!(
                    "record body must be a JSON string, got {}",
                    other
                )));
            }
        };
        message.check()
    }
}

/// A direct invocation carrying the file itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectPayload {
    /// Base64-encoded file bytes.
    pub body: String,
    /// Uploaded file name, used to pick the format by extension.
    #[serde(default)]
    pub file_name: Option<String>,
}

impl DirectPayload {
    pub fn decode(&self) -> Result<Vec<u8>> {
        let compact: String = self.body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        if compact.is_empty() {
            return Err(Error::BadRequest("'body' is empty".into()));
        }
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| Error::BadRequest(format!("'body' is not valid base64: {}", e)))
    }
}

/// A parsed invocation event.
#[derive(Debug, Clone)]
pub enum Invocation {
    Direct(DirectPayload),
    Queued(Vec<QueueRecord>),
}

impl Invocation {
    pub fn parse(event: &serde_json::Value) -> Result<Self> {
        let obj = event
            .as_object()
            .ok_or_else(|| Error::BadRequest("event payload must be a JSON object".into()))?;

        if let Some(records) = obj.get("Records") {
            let records: Vec<QueueRecord> = serde_json::from_value(records.clone())
                .map_err(|e| Error::BadRequest(format!("malformed 'Records': {}", e)))?;
            return Ok(Self::Queued(records));
        }

        match obj.get("body") {
            Some(serde_json::Value::String(_)) => {
                let payload: DirectPayload = serde_json::from_value(event.clone())
                    .map_err(|e| Error::BadRequest(format!("malformed direct payload: {}", e)))?;
                Ok(Self::Direct(payload))
            }
            Some(_) => Err(Error::BadRequest("'body' must be a base64 string".into())),
            None => Err(Error::BadRequest("No 'body' field in event payload".into())),
        }
    }
}
