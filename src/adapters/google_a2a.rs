//! Google Agent2Agent message adapter.
//!
//! Native messages are JSON task requests:
//!
//! ```text
//! { "id", "version": "1.0", "type": "task_request", "source", "target"?,
//!   "timestamp", "payload": { "capability", "parameters", "priority", "timeout"? },
//!   "context": { "trace_id", "retries"? } }
//! ```

use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::adapter::{expect_envelope, expect_json, object_field, ProtocolAdapter};
use crate::error::{Error, Result};
use crate::protocol::envelope::{from_millis, now_millis};
use crate::protocol::{Envelope, Priority, WireMessage, CANONICAL_PROTOCOL, GOOGLE_A2A_PROTOCOL};

const ADAPTER_NAME: &str = "google-a2a-adapter";
const ADAPTER_VERSION: &str = "1.0.0";
const A2A_MESSAGE_VERSION: &str = "1.0";

/// Message types that carry a task and therefore map onto an envelope.
const TASK_MESSAGE_TYPES: [&str; 2] = ["task_request", "task_response"];

/// Adapter between canonical envelopes and Agent2Agent task messages.
#[derive(Debug, Clone, Default)]
pub struct GoogleA2aAdapter;

impl GoogleA2aAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Convert a canonical envelope to an A2A task request.
    pub fn to_a2a(&self, envelope: &Envelope) -> Value {
        let metadata = envelope.metadata();

        let mut payload = Map::new();
        payload.insert("capability".to_string(), json!(envelope.kind()));
        payload.insert("parameters".to_string(), Value::Object(envelope.content().clone()));
        payload.insert("priority".to_string(), json!(priority_to_a2a(envelope.priority())));
        if let Some(timeout) = metadata.timeout() {
            payload.insert("timeout".to_string(), json!(timeout));
        }

        let mut context = Map::new();
        context.insert("trace_id".to_string(), json!(metadata.trace_id()));
        if let Some(retries) = metadata.retries() {
            context.insert("retries".to_string(), json!(retries));
        }

        let mut message = Map::new();
        message.insert("id".to_string(), json!(envelope.id()));
        message.insert("version".to_string(), json!(A2A_MESSAGE_VERSION));
        message.insert("type".to_string(), json!("task_request"));
        message.insert("source".to_string(), json!(envelope.source()));
        if let Some(target) = envelope.target() {
            message.insert("target".to_string(), json!(target));
        }
        message.insert("timestamp".to_string(), json!(metadata.sent_at().timestamp_millis()));
        message.insert("payload".to_string(), Value::Object(payload));
        message.insert("context".to_string(), Value::Object(context));

        Value::Object(message)
    }

    /// Convert an A2A task message to a canonical envelope.
    pub fn from_a2a(&self, message: &Value) -> Result<Envelope> {
        let malformed = |reason: &str| Error::malformed(GOOGLE_A2A_PROTOCOL, reason, &message.to_string());

        if !message.is_object() {
            return Err(malformed("message must be a JSON object"));
        }

        let message_type = message.get("type").and_then(Value::as_str).unwrap_or("task_request");
        if !TASK_MESSAGE_TYPES.contains(&message_type) {
            return Err(malformed(&format!("unsupported message type `{}`", message_type)));
        }

        let payload = message.get("payload").ok_or_else(|| malformed("missing payload"))?;
        let capability = payload
            .get("capability")
            .and_then(Value::as_str)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| malformed("missing payload.capability"))?;
        let parameters = object_field(GOOGLE_A2A_PROTOCOL, payload, "parameters")?.unwrap_or_default();

        let priority = payload
            .get("priority")
            .and_then(Value::as_str)
            .map(priority_from_a2a)
            .unwrap_or_default();

        let source = message
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or(ADAPTER_NAME);

        let context = message.get("context").cloned().unwrap_or(Value::Null);

        let sent_at = match message.get("timestamp").and_then(Value::as_i64) {
            Some(millis) => from_millis(millis).ok_or_else(|| malformed("timestamp out of range"))?,
            None => now_millis(),
        };

        let mut builder = Envelope::builder(capability, source)
            .content(parameters)
            .priority(priority)
            .maybe_target(message.get("target").and_then(Value::as_str).map(str::to_string))
            .sent_at(sent_at)
            .timeout(payload.get("timeout").and_then(Value::as_u64))
            .retries(
                context
                    .get("retries")
                    .and_then(Value::as_u64)
                    .and_then(|r| u32::try_from(r).ok()),
            );

        if let Some(id) = uuid_field(message, "id") {
            builder = builder.id(id);
        }
        if let Some(trace_id) = uuid_field(&context, "trace_id") {
            builder = builder.trace_id(trace_id);
        }

        builder.build()
    }
}

fn uuid_field(parent: &Value, field: &str) -> Option<Uuid> {
    parent
        .get(field)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

fn priority_to_a2a(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "normal",
        Priority::High => "high",
        Priority::Critical => "urgent",
    }
}

fn priority_from_a2a(priority: &str) -> Priority {
    match priority {
        "low" => Priority::Low,
        "high" => Priority::High,
        "urgent" => Priority::Critical,
        _ => Priority::Medium,
    }
}

impl ProtocolAdapter for GoogleA2aAdapter {
    fn name(&self) -> &str {
        ADAPTER_NAME
    }

    fn version(&self) -> &str {
        ADAPTER_VERSION
    }

    fn native_protocol(&self) -> &str {
        GOOGLE_A2A_PROTOCOL
    }

    fn adapt_message(&self, message: WireMessage, target_protocol: &str) -> Result<WireMessage> {
        match target_protocol {
            GOOGLE_A2A_PROTOCOL => {
                let envelope = expect_envelope(GOOGLE_A2A_PROTOCOL, message)?;
                Ok(WireMessage::Json(self.to_a2a(&envelope)))
            }
            CANONICAL_PROTOCOL => {
                let value = expect_json(GOOGLE_A2A_PROTOCOL, message)?;
                Ok(WireMessage::Envelope(self.from_a2a(&value)?))
            }
            other => Err(Error::UnsupportedProtocol(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_task_request() {
        let envelope = Envelope::builder("summarize", "planner")
            .target("writer")
            .priority(Priority::Critical)
            .param("doc", "readme")
            .timeout(Some(30_000))
            .retries(Some(2))
            .build()
            .unwrap();

        let value = GoogleA2aAdapter::new().to_a2a(&envelope);

        assert_eq!(value["version"], "1.0");
        assert_eq!(value["type"], "task_request");
        assert_eq!(value["source"], "planner");
        assert_eq!(value["target"], "writer");
        assert_eq!(value["payload"]["capability"], "summarize");
        assert_eq!(value["payload"]["parameters"]["doc"], "readme");
        assert_eq!(value["payload"]["priority"], "urgent");
        assert_eq!(value["payload"]["timeout"], 30_000);
        assert_eq!(value["context"]["retries"], 2);
        assert_eq!(value["id"], json!(envelope.id()));
        assert_eq!(value["timestamp"], envelope.metadata().sent_at().timestamp_millis());
    }

    #[test]
    fn test_round_trip_keeps_identity() {
        let adapter = GoogleA2aAdapter::new();
        let envelope = Envelope::builder("summarize", "planner")
            .priority(Priority::Low)
            .param("doc", "readme")
            .param("depth", 2)
            .build()
            .unwrap();

        let decoded = adapter.from_a2a(&adapter.to_a2a(&envelope)).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_decode_defaults() {
        let value = json!({
            "id": "not-a-uuid",
            "type": "task_request",
            "payload": {"capability": "ping"}
        });
        let envelope = GoogleA2aAdapter::new().from_a2a(&value).unwrap();

        assert_eq!(envelope.kind(), "ping");
        assert_eq!(envelope.source(), "google-a2a-adapter");
        assert_eq!(envelope.priority(), Priority::Medium);
        assert_eq!(envelope.version(), "2.0");
        assert!(envelope.content().is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_messages() {
        let adapter = GoogleA2aAdapter::new();

        let heartbeat = json!({"type": "heartbeat", "payload": {"capability": "x"}});
        assert!(matches!(adapter.from_a2a(&heartbeat), Err(Error::MalformedProtocol { .. })));

        let missing = json!({"type": "task_request", "payload": {}});
        assert!(matches!(adapter.from_a2a(&missing), Err(Error::MalformedProtocol { .. })));

        let bad_params = json!({"payload": {"capability": "x", "parameters": [1, 2]}});
        assert!(matches!(adapter.from_a2a(&bad_params), Err(Error::MalformedProtocol { .. })));

        assert!(adapter.from_a2a(&json!("text")).is_err());
    }

    #[test]
    fn test_decode_out_of_range_timestamp() {
        let adapter = GoogleA2aAdapter::new();
        let message = json!({"payload": {"capability": "x"}, "timestamp": i64::MAX});
        assert!(matches!(adapter.from_a2a(&message), Err(Error::MalformedProtocol { .. })));
    }

    #[test]
    fn test_adapt_message_accepts_json_text() {
        let adapter = GoogleA2aAdapter::new();
        let text = r#"{"type":"task_request","source":"a","payload":{"capability":"ping","parameters":{"n":1}}}"#;

        let envelope = adapter
            .adapt_message(WireMessage::Text(text.to_string()), CANONICAL_PROTOCOL)
            .unwrap()
            .into_envelope()
            .unwrap();
        assert_eq!(envelope.kind(), "ping");
        assert_eq!(envelope.content()["n"], 1);

        let err = adapter
            .adapt_message(WireMessage::Envelope(envelope), "anthropic-xml-v1.0")
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedProtocol(_)));
    }
}
