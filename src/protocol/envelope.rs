//! The canonical message envelope every adapter translates to and from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::types::Priority;
use crate::error::{Error, Result};

/// Version stamped on envelopes when the source protocol carries none.
pub const DEFAULT_ENVELOPE_VERSION: &str = "2.0";

/// Canonical message: routing header plus payload body.
///
/// Envelopes are immutable once built. Adapters read them through the
/// accessors and produce new values instead of editing in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedEnvelope")]
pub struct Envelope {
    header: Header,
    body: Body,
}

/// Routing header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    id: Uuid,
    /// Operation or function name
    #[serde(rename = "type")]
    kind: String,
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    priority: Priority,
    source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<String>,
}

/// Payload body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Operation parameters, in insertion order
    #[serde(default)]
    content: Map<String, Value>,
    metadata: Metadata,
}

/// Delivery metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    sent_at: DateTime<Utc>,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retries: Option<u32>,
    trace_id: Uuid,
}

#[derive(Deserialize)]
struct UncheckedEnvelope {
    header: Header,
    body: Body,
}

impl TryFrom<UncheckedEnvelope> for Envelope {
    type Error = Error;

    fn try_from(raw: UncheckedEnvelope) -> Result<Self> {
        validate_kind(&raw.header.kind)?;
        Ok(Self {
            header: raw.header,
            body: raw.body,
        })
    }
}

fn default_version() -> String {
    DEFAULT_ENVELOPE_VERSION.to_string()
}

fn validate_kind(kind: &str) -> Result<()> {
    if kind.trim().is_empty() {
        return Err(Error::InvalidEnvelope("header.type must not be empty".to_string()));
    }
    Ok(())
}

/// Current time truncated to the millisecond precision the wire formats carry.
pub(crate) fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    from_millis(now.timestamp_millis()).unwrap_or(now)
}

/// `None` when `millis` falls outside the representable date range.
pub(crate) fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

impl Envelope {
    /// Start building an envelope for operation `kind` sent by `source`.
    pub fn builder(kind: impl Into<String>, source: impl Into<String>) -> EnvelopeBuilder {
        EnvelopeBuilder::new(kind, source)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn id(&self) -> Uuid {
        self.header.id
    }

    /// Operation or function name (`header.type`).
    pub fn kind(&self) -> &str {
        &self.header.kind
    }

    pub fn version(&self) -> &str {
        &self.header.version
    }

    pub fn priority(&self) -> Priority {
        self.header.priority
    }

    pub fn source(&self) -> &str {
        &self.header.source
    }

    pub fn target(&self) -> Option<&str> {
        self.header.target.as_deref()
    }

    pub fn content(&self) -> &Map<String, Value> {
        &self.body.content
    }

    pub fn metadata(&self) -> &Metadata {
        &self.body.metadata
    }

    /// Parse an envelope from its JSON form, enforcing the envelope invariants.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Compare everything except the per-instance identity (ids, send time).
    pub fn same_payload(&self, other: &Envelope) -> bool {
        self.header.kind == other.header.kind
            && self.header.version == other.header.version
            && self.header.priority == other.header.priority
            && self.header.source == other.header.source
            && self.header.target == other.header.target
            && self.body.content == other.body.content
            && self.body.metadata.timeout == other.body.metadata.timeout
            && self.body.metadata.retries == other.body.metadata.retries
    }
}

impl Metadata {
    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    pub fn timeout(&self) -> Option<u64> {
        self.timeout
    }

    pub fn retries(&self) -> Option<u32> {
        self.retries
    }

    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }
}

/// Builder for envelopes with fluent API.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    kind: String,
    source: String,
    id: Option<Uuid>,
    version: String,
    priority: Priority,
    target: Option<String>,
    content: Map<String, Value>,
    sent_at: Option<DateTime<Utc>>,
    timeout: Option<u64>,
    retries: Option<u32>,
    trace_id: Option<Uuid>,
}

impl EnvelopeBuilder {
    pub fn new(kind: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            source: source.into(),
            id: None,
            version: default_version(),
            priority: Priority::default(),
            target: None,
            content: Map::new(),
            sent_at: None,
            timeout: None,
            retries: None,
            trace_id: None,
        }
    }

    /// Reuse an existing message id instead of generating one.
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn maybe_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }

    /// Replace the whole parameter map.
    pub fn content(mut self, content: Map<String, Value>) -> Self {
        self.content = content;
        self
    }

    /// Append one parameter, keeping insertion order.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.content.insert(key.into(), value.into());
        self
    }

    pub fn sent_at(mut self, sent_at: DateTime<Utc>) -> Self {
        self.sent_at = Some(sent_at);
        self
    }

    /// Delivery timeout in milliseconds.
    pub fn timeout(mut self, timeout: Option<u64>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retries(mut self, retries: Option<u32>) -> Self {
        self.retries = retries;
        self
    }

    pub fn trace_id(mut self, trace_id: Uuid) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Build the envelope. Fails if the operation name is empty.
    pub fn build(self) -> Result<Envelope> {
        validate_kind(&self.kind)?;

        Ok(Envelope {
            header: Header {
                id: self.id.unwrap_or_else(Uuid::new_v4),
                kind: self.kind,
                version: self.version,
                priority: self.priority,
                source: self.source,
                target: self.target,
            },
            body: Body {
                content: self.content,
                metadata: Metadata {
                    sent_at: self.sent_at.unwrap_or_else(now_millis),
                    timeout: self.timeout,
                    retries: self.retries,
                    trace_id: self.trace_id.unwrap_or_else(Uuid::new_v4),
                },
            },
        })
    }
}
