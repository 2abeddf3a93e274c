//! Composition root for the translation core.

use std::sync::Arc;

use super::registry::ProtocolAdapterRegistry;
use super::types::WireMessage;
use crate::adapters::{self, ProtocolAdapter};
use crate::config::{validate_settings, Settings};
use crate::error::Result;

/// Owns the adapter registry and hands it out to whatever composes the system.
#[derive(Clone)]
pub struct ProtocolModule {
    registry: Arc<ProtocolAdapterRegistry>,
}

impl ProtocolModule {
    /// Build a registry with the built-in adapters enabled in `settings`.
    pub fn new(settings: &Settings) -> Result<Self> {
        validate_settings(settings)?;

        let registry = ProtocolAdapterRegistry::with_adapters(adapters::enabled_adapters(settings));
        tracing::debug!(
            "Protocol module ready with {} adapters",
            registry.get_all_adapters().len()
        );

        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    /// Shared handle to the registry.
    pub fn registry(&self) -> Arc<ProtocolAdapterRegistry> {
        Arc::clone(&self.registry)
    }

    /// Register an additional adapter at runtime.
    pub fn register_adapter(&self, adapter: Arc<dyn ProtocolAdapter>) {
        self.registry.register_adapter(adapter);
    }

    pub fn translate(
        &self,
        message: WireMessage,
        source_protocol: &str,
        target_protocol: &str,
    ) -> Result<WireMessage> {
        self.registry
            .translate_message(message, source_protocol, target_protocol)
    }
}
