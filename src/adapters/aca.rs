//! Agent communication protocol (ACA) adapter.
//!
//! ACA messages are mailbox envelopes exchanged between agents: a routing
//! shell (`from_agent`, `to_agent`, correlation id, expiry) around a typed
//! agent message whose data travels as JSON text in `message.payload`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::adapter::{decode_embedded_value, expect_envelope, expect_json, ProtocolAdapter};
use crate::error::{Error, Result};
use crate::protocol::envelope::{from_millis, now_millis};
use crate::protocol::{Envelope, Priority, WireMessage, ACA_PROTOCOL, CANONICAL_PROTOCOL};

const ADAPTER_NAME: &str = "aca-protocol-adapter";
const ADAPTER_VERSION: &str = "1.0.0";

/// ACA priority vocabulary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AcaPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl From<Priority> for AcaPriority {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Low => AcaPriority::Low,
            Priority::Medium => AcaPriority::Normal,
            Priority::High => AcaPriority::High,
            Priority::Critical => AcaPriority::Urgent,
        }
    }
}

impl From<AcaPriority> for Priority {
    fn from(priority: AcaPriority) -> Self {
        match priority {
            AcaPriority::Low => Priority::Low,
            AcaPriority::Normal => Priority::Medium,
            AcaPriority::High => Priority::High,
            AcaPriority::Urgent => Priority::Critical,
        }
    }
}

/// ACA mailbox envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcaEnvelope {
    /// Unique message ID
    pub id: String,
    /// Correlation ID for request/response chains
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Sender agent ID
    pub from_agent: String,
    /// Recipient agent ID (None for broadcast)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_agent: Option<String>,
    pub message: AcaMessage,
    /// Creation timestamp (unix ms)
    pub created_at: i64,
    /// Expiration timestamp (unix ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

/// The typed message inside an ACA envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcaMessage {
    #[serde(default = "default_message_type")]
    pub message_type: String,
    #[serde(default)]
    pub priority: AcaPriority,
    /// Operation name
    pub subject: Option<String>,
    #[serde(default)]
    pub body: String,
    /// Attached data (JSON text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

fn default_message_type() -> String {
    "request".to_string()
}

/// Adapter between canonical envelopes and ACA mailbox envelopes.
#[derive(Debug, Clone, Default)]
pub struct AcaProtocolAdapter {
    strict: bool,
}

impl AcaProtocolAdapter {
    pub fn new() -> Self {
        Self { strict: false }
    }

    pub fn with_strict(strict: bool) -> Self {
        Self { strict }
    }

    /// Convert a canonical envelope to an ACA envelope.
    pub fn to_aca(&self, envelope: &Envelope) -> Result<AcaEnvelope> {
        let metadata = envelope.metadata();
        let created_at = metadata.sent_at().timestamp_millis();

        Ok(AcaEnvelope {
            id: envelope.id().to_string(),
            correlation_id: Some(metadata.trace_id().to_string()),
            from_agent: envelope.source().to_string(),
            to_agent: envelope.target().map(str::to_string),
            message: AcaMessage {
                message_type: default_message_type(),
                priority: envelope.priority().into(),
                subject: Some(envelope.kind().to_string()),
                body: String::new(),
                payload: Some(serde_json::to_string(envelope.content())?),
            },
            created_at,
            expires_at: metadata
                .timeout()
                .and_then(|t| i64::try_from(t).ok())
                .and_then(|t| created_at.checked_add(t)),
            max_attempts: metadata.retries(),
        })
    }

    /// Convert an ACA envelope to a canonical envelope.
    pub fn from_aca(&self, aca: &AcaEnvelope) -> Result<Envelope> {
        let subject = aca
            .message
            .subject
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::malformed(ACA_PROTOCOL, "missing message.subject", &aca.id))?;

        let mut content = match aca.message.payload.as_deref() {
            Some(raw) => match decode_embedded_value(ACA_PROTOCOL, raw.trim(), self.strict)? {
                Value::Object(map) => map,
                other => {
                    let mut map = Map::new();
                    map.insert("payload".to_string(), other);
                    map
                }
            },
            None => Map::new(),
        };
        if !aca.message.body.is_empty() && !content.contains_key("body") {
            content.insert("body".to_string(), Value::String(aca.message.body.clone()));
        }

        let sent_at = if aca.created_at > 0 {
            from_millis(aca.created_at)
                .ok_or_else(|| Error::malformed(ACA_PROTOCOL, "created_at out of range", &aca.id))?
        } else {
            now_millis()
        };

        // Timeout is measured from the same instant sent_at records.
        let timeout = match aca.expires_at {
            Some(expires) => {
                let remaining = expires
                    .checked_sub(sent_at.timestamp_millis())
                    .ok_or_else(|| Error::malformed(ACA_PROTOCOL, "expires_at out of range", &aca.id))?;
                u64::try_from(remaining).ok()
            }
            None => None,
        };

        let mut builder = Envelope::builder(subject, aca.from_agent.clone())
            .content(content)
            .priority(aca.message.priority.into())
            .maybe_target(aca.to_agent.clone())
            .sent_at(sent_at)
            .timeout(timeout)
            .retries(aca.max_attempts);

        if let Ok(id) = Uuid::parse_str(&aca.id) {
            builder = builder.id(id);
        }
        if let Some(trace_id) = aca.correlation_id.as_deref().and_then(|c| Uuid::parse_str(c).ok()) {
            builder = builder.trace_id(trace_id);
        }

        builder.build()
    }
}

impl ProtocolAdapter for AcaProtocolAdapter {
    fn name(&self) -> &str {
        ADAPTER_NAME
    }

    fn version(&self) -> &str {
        ADAPTER_VERSION
    }

    fn native_protocol(&self) -> &str {
        ACA_PROTOCOL
    }

    fn adapt_message(&self, message: WireMessage, target_protocol: &str) -> Result<WireMessage> {
        match target_protocol {
            ACA_PROTOCOL => {
                let envelope = expect_envelope(ACA_PROTOCOL, message)?;
                Ok(WireMessage::Json(serde_json::to_value(self.to_aca(&envelope)?)?))
            }
            CANONICAL_PROTOCOL => {
                let value = expect_json(ACA_PROTOCOL, message)?;
                let aca: AcaEnvelope = serde_json::from_value(value.clone()).map_err(|e| {
                    Error::malformed(ACA_PROTOCOL, format!("invalid envelope: {}", e), &value.to_string())
                })?;
                Ok(WireMessage::Envelope(self.from_aca(&aca)?))
            }
            other => Err(Error::UnsupportedProtocol(other.to_string())),
        }
    }
}
