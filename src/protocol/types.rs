//! Value types shared by the envelope, the adapters and the registry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::envelope::Envelope;

/// Message priority levels of the canonical envelope.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low = 0,
    #[default]
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message in flight between protocols.
///
/// Which variant a protocol uses is fixed per protocol id: the canonical
/// protocol always carries an [`Envelope`], text protocols (Anthropic XML)
/// carry `Text`, JSON protocols emit `Json` and accept `Json` or `Text`.
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    Envelope(Envelope),
    Text(String),
    Json(Value),
}

impl WireMessage {
    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::Envelope(_) => "envelope",
            WireMessage::Text(_) => "text",
            WireMessage::Json(_) => "json",
        }
    }

    pub fn as_envelope(&self) -> Option<&Envelope> {
        match self {
            WireMessage::Envelope(envelope) => Some(envelope),
            _ => None,
        }
    }

    pub fn into_envelope(self) -> Option<Envelope> {
        match self {
            WireMessage::Envelope(envelope) => Some(envelope),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            WireMessage::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            WireMessage::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Render the message for output: text as-is, everything else as
    /// pretty-printed JSON.
    pub fn render(&self) -> crate::Result<String> {
        Ok(match self {
            WireMessage::Text(text) => text.clone(),
            WireMessage::Json(value) => serde_json::to_string_pretty(value)?,
            WireMessage::Envelope(envelope) => serde_json::to_string_pretty(envelope)?,
        })
    }
}

impl From<Envelope> for WireMessage {
    fn from(envelope: Envelope) -> Self {
        WireMessage::Envelope(envelope)
    }
}

impl From<String> for WireMessage {
    fn from(text: String) -> Self {
        WireMessage::Text(text)
    }
}

impl From<&str> for WireMessage {
    fn from(text: &str) -> Self {
        WireMessage::Text(text.to_string())
    }
}

impl From<Value> for WireMessage {
    fn from(value: Value) -> Self {
        WireMessage::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_default_and_ordering() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_priority_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Priority::Critical).unwrap(), json!("critical"));
        let parsed: Priority = serde_json::from_value(json!("low")).unwrap();
        assert_eq!(parsed, Priority::Low);
    }

    #[test]
    fn test_wire_message_kinds() {
        assert_eq!(WireMessage::from("<x/>").kind(), "text");
        assert_eq!(WireMessage::from(json!({"a": 1})).kind(), "json");
        assert_eq!(WireMessage::from("<x/>").as_text(), Some("<x/>"));
        assert!(WireMessage::from(json!(1)).as_envelope().is_none());
    }
}
