//! Adapter registry and protocol translation.
//!
//! The registry resolves adapters by protocol id and translates messages
//! either directly (one adapter speaks both protocols) or in two hops
//! through the canonical envelope. Two-hop routing needs one adapter per
//! protocol instead of one converter per protocol pair; the price is that
//! anything a protocol carries outside the envelope's fields is lost on the
//! way through.

use parking_lot::RwLock;
use std::sync::Arc;

use super::types::WireMessage;
use super::CANONICAL_PROTOCOL;
use crate::adapters::ProtocolAdapter;
use crate::error::{Error, Result};

/// Holds registered adapters in registration order.
///
/// When several adapters claim the same protocol id, the one registered
/// first is chosen. Re-registering a name replaces that adapter in place.
#[derive(Default)]
pub struct ProtocolAdapterRegistry {
    adapters: RwLock<Vec<Arc<dyn ProtocolAdapter>>>,
}

impl ProtocolAdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with `adapters`, in order.
    pub fn with_adapters(adapters: impl IntoIterator<Item = Arc<dyn ProtocolAdapter>>) -> Self {
        let registry = Self::new();
        for adapter in adapters {
            registry.register_adapter(adapter);
        }
        registry
    }

    /// Register an adapter. Last write wins by adapter name.
    pub fn register_adapter(&self, adapter: Arc<dyn ProtocolAdapter>) {
        let mut adapters = self.adapters.write();

        for protocol in adapter.supported_protocols() {
            if protocol == CANONICAL_PROTOCOL {
                continue;
            }
            if let Some(existing) = adapters
                .iter()
                .find(|a| a.name() != adapter.name() && a.can_handle(protocol))
            {
                tracing::warn!(
                    "Protocol {} is already claimed by {}; lookups keep resolving to it, not {}",
                    protocol,
                    existing.name(),
                    adapter.name()
                );
            }
        }

        tracing::info!("Registered protocol adapter: {} v{}", adapter.name(), adapter.version());

        match adapters.iter().position(|a| a.name() == adapter.name()) {
            Some(pos) => adapters[pos] = adapter,
            None => adapters.push(adapter),
        }
    }

    pub fn get_adapter(&self, name: &str) -> Option<Arc<dyn ProtocolAdapter>> {
        self.adapters.read().iter().find(|a| a.name() == name).cloned()
    }

    /// All registered adapters, in registration order.
    pub fn get_all_adapters(&self) -> Vec<Arc<dyn ProtocolAdapter>> {
        self.adapters.read().clone()
    }

    /// Every protocol id some registered adapter claims, deduplicated.
    pub fn protocols(&self) -> Vec<String> {
        let mut protocols: Vec<String> = Vec::new();
        for adapter in self.adapters.read().iter() {
            for protocol in adapter.supported_protocols() {
                if !protocols.iter().any(|p| p == protocol) {
                    protocols.push(protocol.to_string());
                }
            }
        }
        protocols
    }

    /// First adapter, in registration order, that can handle `protocol`.
    pub fn find_adapter_for_protocol(&self, protocol: &str) -> Option<Arc<dyn ProtocolAdapter>> {
        self.adapters
            .read()
            .iter()
            .find(|a| a.can_handle(protocol))
            .cloned()
    }

    /// Translate `message` from `source_protocol` to `target_protocol`.
    ///
    /// Identical protocols return the message untouched without consulting
    /// any adapter. Adapter errors are returned unchanged.
    pub fn translate_message(
        &self,
        message: WireMessage,
        source_protocol: &str,
        target_protocol: &str,
    ) -> Result<WireMessage> {
        if source_protocol == target_protocol {
            return Ok(message);
        }

        let result = self.translate_between(message, source_protocol, target_protocol);
        if let Err(e) = &result {
            tracing::error!(
                "Translation from {} to {} failed: {}",
                source_protocol,
                target_protocol,
                e
            );
        }
        result
    }

    fn translate_between(
        &self,
        message: WireMessage,
        source_protocol: &str,
        target_protocol: &str,
    ) -> Result<WireMessage> {
        let source_adapter = self
            .find_adapter_for_protocol(source_protocol)
            .ok_or_else(|| Error::NoAdapter(source_protocol.to_string()))?;
        let target_adapter = self
            .find_adapter_for_protocol(target_protocol)
            .ok_or_else(|| Error::NoAdapter(target_protocol.to_string()))?;

        if source_adapter.can_handle(target_protocol) {
            tracing::debug!(
                "Translating {} -> {} directly via {}",
                source_protocol,
                target_protocol,
                source_adapter.name()
            );
            return source_adapter.adapt_message(message, target_protocol);
        }

        tracing::debug!(
            "Translating {} -> {} via {} and {}",
            source_protocol,
            target_protocol,
            source_adapter.name(),
            target_adapter.name()
        );

        // A canonical message needs no first hop, and a canonical target no second.
        let intermediate = if source_protocol == CANONICAL_PROTOCOL {
            message
        } else {
            source_adapter.adapt_message(message, CANONICAL_PROTOCOL)?
        };

        if target_protocol == CANONICAL_PROTOCOL {
            return Ok(intermediate);
        }
        target_adapter.adapt_message(intermediate, target_protocol)
    }
}
