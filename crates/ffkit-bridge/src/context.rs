//! Dependencies shared by every handler during one attach cycle.

use std::sync::Arc;

use ffkit_core::Toolkit;

use crate::events::EventBroadcaster;
use crate::platform::Platform;

/// Handler context.
pub struct BridgeContext {
    /// Session registry and execution backend.
    pub toolkit: Arc<dyn Toolkit>,
    /// Event channel and its feature flags.
    pub events: Arc<EventBroadcaster>,
    /// Host platform, when one is attached.
    pub platform: Option<Arc<dyn Platform>>,
}

impl BridgeContext {
    /// Platform name, falling back to the host operating system.
    pub fn platform_name(&self) -> String {
        self.platform
            .as_ref()
            .map_or_else(|| std::env::consts::OS.to_string(), |p| p.name())
    }
}
