//! Error types for agentwire.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported target protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("No adapter found for protocol: {0}")]
    NoAdapter(String),

    #[error("Malformed {protocol} message: {reason} (near `{snippet}`)")]
    MalformedProtocol {
        protocol: String,
        reason: String,
        snippet: String,
    },

    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Longest input excerpt carried by a malformed-message error.
const SNIPPET_LEN: usize = 80;

impl Error {
    /// Build a malformed-message error, keeping a short excerpt of the input.
    pub fn malformed(protocol: impl Into<String>, reason: impl Into<String>, input: &str) -> Self {
        Error::MalformedProtocol {
            protocol: protocol.into(),
            reason: reason.into(),
            snippet: snippet(input),
        }
    }
}

fn snippet(input: &str) -> String {
    let trimmed = input.trim();
    match trimmed.char_indices().nth(SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_keeps_short_input() {
        let err = Error::malformed("anthropic-xml-v1.0", "missing function name", "  <foo/>  ");
        match err {
            Error::MalformedProtocol { snippet, protocol, .. } => {
                assert_eq!(snippet, "<foo/>");
                assert_eq!(protocol, "anthropic-xml-v1.0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_truncates_long_input() {
        let input = "x".repeat(200);
        let err = Error::malformed("aca-v1.0", "bad", &input);
        let message = err.to_string();
        assert!(message.contains(&format!("{}...", "x".repeat(SNIPPET_LEN))));
        assert!(!message.contains(&"x".repeat(SNIPPET_LEN + 1)));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::NoAdapter("nonexistent-protocol".to_string()).to_string(),
            "No adapter found for protocol: nonexistent-protocol"
        );
        assert_eq!(
            Error::UnsupportedProtocol("x-v1.0".to_string()).to_string(),
            "Unsupported target protocol: x-v1.0"
        );
    }
}
