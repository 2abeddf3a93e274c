//! agentwire library root.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;

pub use adapters::{
    AcaProtocolAdapter, AnthropicXmlAdapter, GoogleA2aAdapter, McpJsonRpcAdapter, ProtocolAdapter,
    ToolDefinition,
};
pub use cli::Commands;
pub use config::{load_settings, Settings};
pub use error::{Error, Result};
pub use protocol::{
    Envelope, EnvelopeBuilder, Priority, ProtocolAdapterRegistry, ProtocolModule, WireMessage,
    CANONICAL_PROTOCOL,
};
