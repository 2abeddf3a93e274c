//! Model Context Protocol (JSON-RPC 2.0) adapter.

use serde_json::{json, Value};
use uuid::Uuid;

use super::adapter::{expect_envelope, expect_json, object_field, ProtocolAdapter};
use crate::error::{Error, Result};
use crate::protocol::{Envelope, WireMessage, CANONICAL_PROTOCOL, MCP_JSONRPC_PROTOCOL};

const ADAPTER_NAME: &str = "mcp-jsonrpc-adapter";
const ADAPTER_VERSION: &str = "1.0.0";
const JSONRPC_VERSION: &str = "2.0";
const TOOLS_CALL: &str = "tools/call";

/// Adapter between canonical envelopes and MCP JSON-RPC requests.
///
/// Envelopes become `tools/call` requests. Requests for any other method
/// decode with the method as the operation and `params` as the content.
#[derive(Debug, Clone, Default)]
pub struct McpJsonRpcAdapter;

impl McpJsonRpcAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn to_request(&self, envelope: &Envelope) -> Value {
        json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": envelope.id(),
            "method": TOOLS_CALL,
            "params": {
                "name": envelope.kind(),
                "arguments": envelope.content(),
            },
        })
    }

    pub fn from_request(&self, request: &Value) -> Result<Envelope> {
        let malformed = |reason: &str| Error::malformed(MCP_JSONRPC_PROTOCOL, reason, &request.to_string());

        if request.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err(malformed("jsonrpc must be \"2.0\""));
        }
        let method = request
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("missing method"))?;

        let params = request.get("params").cloned().unwrap_or(Value::Null);
        let (kind, content) = if method == TOOLS_CALL {
            let name = params
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed("tools/call without params.name"))?;
            let arguments = object_field(MCP_JSONRPC_PROTOCOL, &params, "arguments")?;
            (name.to_string(), arguments.unwrap_or_default())
        } else {
            let params = match params {
                Value::Null => Default::default(),
                Value::Object(map) => map,
                _ => return Err(malformed("params must be an object")),
            };
            (method.to_string(), params)
        };

        let mut builder = Envelope::builder(kind, ADAPTER_NAME).content(content);
        if let Some(id) = request
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
        {
            builder = builder.id(id);
        }

        builder.build()
    }
}

impl ProtocolAdapter for McpJsonRpcAdapter {
    fn name(&self) -> &str {
        ADAPTER_NAME
    }

    fn version(&self) -> &str {
        ADAPTER_VERSION
    }

    fn native_protocol(&self) -> &str {
        MCP_JSONRPC_PROTOCOL
    }

    fn adapt_message(&self, message: WireMessage, target_protocol: &str) -> Result<WireMessage> {
        match target_protocol {
            MCP_JSONRPC_PROTOCOL => {
                let envelope = expect_envelope(MCP_JSONRPC_PROTOCOL, message)?;
                Ok(WireMessage::Json(self.to_request(&envelope)))
            }
            CANONICAL_PROTOCOL => {
                let value = expect_json(MCP_JSONRPC_PROTOCOL, message)?;
                Ok(WireMessage::Envelope(self.from_request(&value)?))
            }
            other => Err(Error::UnsupportedProtocol(other.to_string())),
        }
    }
}
