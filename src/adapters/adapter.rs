//! Protocol adapter trait for agentwire.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::protocol::{Envelope, WireMessage, CANONICAL_PROTOCOL};

/// A codec between one external wire protocol and the canonical envelope.
///
/// Adapters are constructed once, registered, and shared across threads for
/// the life of the process. They hold no per-message state.
pub trait ProtocolAdapter: Send + Sync {
    /// Unique adapter name.
    fn name(&self) -> &str;

    /// Adapter version.
    fn version(&self) -> &str;

    /// The non-canonical protocol this adapter speaks natively.
    fn native_protocol(&self) -> &str;

    /// Every protocol id this adapter can consume or emit.
    fn supported_protocols(&self) -> Vec<&str> {
        vec![CANONICAL_PROTOCOL, self.native_protocol()]
    }

    /// Check if this adapter can handle the given protocol.
    fn can_handle(&self, protocol: &str) -> bool {
        self.supported_protocols().contains(&protocol)
    }

    /// Convert a message towards `target_protocol`.
    ///
    /// Targeting the native protocol encodes a canonical envelope; targeting
    /// the canonical protocol decodes a native message. Any other target is
    /// [`Error::UnsupportedProtocol`].
    fn adapt_message(&self, message: WireMessage, target_protocol: &str) -> Result<WireMessage>;
}

/// Unwrap the canonical envelope an encode step expects.
pub(crate) fn expect_envelope(protocol: &str, message: WireMessage) -> Result<Envelope> {
    match message {
        WireMessage::Envelope(envelope) => Ok(envelope),
        other => Err(Error::malformed(
            protocol,
            format!("expected a canonical envelope, got {}", other.kind()),
            &preview(&other),
        )),
    }
}

/// Unwrap the text a text-protocol decode step expects.
pub(crate) fn expect_text(protocol: &str, message: WireMessage) -> Result<String> {
    match message {
        WireMessage::Text(text) => Ok(text),
        other => Err(Error::malformed(
            protocol,
            format!("expected text, got {}", other.kind()),
            &preview(&other),
        )),
    }
}

/// Unwrap the JSON a JSON-protocol decode step expects, parsing text if needed.
pub(crate) fn expect_json(protocol: &str, message: WireMessage) -> Result<Value> {
    match message {
        WireMessage::Json(value) => Ok(value),
        WireMessage::Text(text) => serde_json::from_str(&text)
            .map_err(|e| Error::malformed(protocol, format!("invalid JSON: {}", e), &text)),
        other => Err(Error::malformed(
            protocol,
            format!("expected JSON, got {}", other.kind()),
            &preview(&other),
        )),
    }
}

fn preview(message: &WireMessage) -> String {
    match message {
        WireMessage::Text(text) => text.clone(),
        WireMessage::Json(value) => value.to_string(),
        WireMessage::Envelope(envelope) => envelope.kind().to_string(),
    }
}

/// Interpret a raw parameter value taken from a text protocol.
///
/// Text that looks like a JSON object or array is parsed. When parsing fails
/// the raw text is kept, unless `strict` is set, in which case the value is
/// rejected as malformed. Any other text stays a string.
pub fn decode_embedded_value(protocol: &str, raw: &str, strict: bool) -> Result<Value> {
    let looks_like_json = (raw.starts_with('{') && raw.ends_with('}'))
        || (raw.starts_with('[') && raw.ends_with(']'));

    if !looks_like_json {
        return Ok(Value::String(raw.to_string()));
    }

    match serde_json::from_str(raw) {
        Ok(value) => Ok(value),
        Err(e) if strict => Err(Error::malformed(
            protocol,
            format!("embedded JSON does not parse: {}", e),
            raw,
        )),
        Err(e) => {
            tracing::debug!("Keeping unparseable embedded JSON as text: {}", e);
            Ok(Value::String(raw.to_string()))
        }
    }
}

/// Render a value the way text protocols carry it: strings raw, everything
/// else as compact JSON.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read an optional JSON object field, rejecting any other shape.
pub(crate) fn object_field(
    protocol: &str,
    parent: &Value,
    field: &str,
) -> Result<Option<Map<String, Value>>> {
    match parent.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map.clone())),
        Some(other) => Err(Error::malformed(
            protocol,
            format!("`{}` must be an object", field),
            &other.to_string(),
        )),
    }
}
