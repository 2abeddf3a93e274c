//! Protocol adapters module.

use std::sync::Arc;

pub mod aca;
pub mod adapter;
pub mod anthropic_xml;
pub mod google_a2a;
pub mod mcp;

pub use aca::AcaProtocolAdapter;
pub use adapter::{decode_embedded_value, stringify_value, ProtocolAdapter};
pub use anthropic_xml::{AnthropicXmlAdapter, FunctionCall, FunctionResult, ToolDefinition};
pub use google_a2a::GoogleA2aAdapter;
pub use mcp::McpJsonRpcAdapter;

use crate::config::Settings;

/// Built-in adapter names, in default registration order.
pub const BUILTIN_ADAPTERS: [&str; 4] = [
    "anthropic-xml-adapter",
    "google-a2a-adapter",
    "aca-protocol-adapter",
    "mcp-jsonrpc-adapter",
];

/// Adapter factory.
pub fn create_adapter(name: &str, settings: &Settings) -> Option<Arc<dyn ProtocolAdapter>> {
    let strict = settings.adapters.strict_parameters;
    match name {
        "anthropic-xml-adapter" => Some(Arc::new(AnthropicXmlAdapter::with_strict(strict))),
        "google-a2a-adapter" => Some(Arc::new(GoogleA2aAdapter::new())),
        "aca-protocol-adapter" => Some(Arc::new(AcaProtocolAdapter::with_strict(strict))),
        "mcp-jsonrpc-adapter" => Some(Arc::new(McpJsonRpcAdapter::new())),
        _ => None,
    }
}

/// Create every adapter enabled in settings, in configured order.
pub fn enabled_adapters(settings: &Settings) -> Vec<Arc<dyn ProtocolAdapter>> {
    settings
        .adapters
        .enabled
        .iter()
        .filter_map(|name| {
            let adapter = create_adapter(name, settings);
            if adapter.is_none() {
                tracing::warn!("Skipping unknown adapter: {}", name);
            }
            adapter
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_knows_every_builtin() {
        let settings = Settings::default();
        for name in BUILTIN_ADAPTERS {
            let adapter = create_adapter(name, &settings).unwrap();
            assert_eq!(adapter.name(), name);
            assert!(adapter.can_handle(crate::protocol::CANONICAL_PROTOCOL));
        }
        assert!(create_adapter("nope", &settings).is_none());
    }

    #[test]
    fn test_enabled_adapters_follow_settings_order() {
        let mut settings = Settings::default();
        settings.adapters.enabled = vec![
            "mcp-jsonrpc-adapter".to_string(),
            "unknown".to_string(),
            "anthropic-xml-adapter".to_string(),
        ];

        let names: Vec<String> = enabled_adapters(&settings)
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        assert_eq!(names, vec!["mcp-jsonrpc-adapter", "anthropic-xml-adapter"]);
    }
}
