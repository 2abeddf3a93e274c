//! Agent message protocols for agentwire.
//!
//! This module defines the translation core:
//! - The canonical message envelope every adapter speaks
//! - The adapter registry with direct and two-hop translation
//! - The protocol module that wires built-in adapters together

pub mod envelope;
pub mod module;
pub mod registry;
pub mod types;

pub use envelope::{Body, Envelope, EnvelopeBuilder, Header, Metadata};
pub use module::ProtocolModule;
pub use registry::ProtocolAdapterRegistry;
pub use types::{Priority, WireMessage};

/// Protocol id of the canonical envelope, the hub of two-hop translation.
pub const CANONICAL_PROTOCOL: &str = "a2a-v2.0";

/// Anthropic XML function calling.
pub const ANTHROPIC_XML_PROTOCOL: &str = "anthropic-xml-v1.0";

/// Google Agent2Agent task messages.
pub const GOOGLE_A2A_PROTOCOL: &str = "google-a2a-v1.0";

/// Agent communication protocol mailbox envelopes.
pub const ACA_PROTOCOL: &str = "aca-v1.0";

/// Model Context Protocol JSON-RPC requests.
pub const MCP_JSONRPC_PROTOCOL: &str = "mcp-jsonrpc-v2.0";
