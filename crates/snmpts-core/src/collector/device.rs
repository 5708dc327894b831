//! Polled device and its capability registries.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::collector::resolver::IndexResolver;
use crate::collector::traits::{Modifier, Resolver};
use crate::rates::RateModifier;

/// Name of the resolver used when a table metric does not name one.
pub const DEFAULT_RESOLVER: &str = "default";

/// Name of the modifier bound to metrics with `rate` enabled.
pub const RATE_MODIFIER: &str = "rate";

/// A polled device: its hostname plus the resolvers and value modifiers that
/// metric definitions may bind to.
///
/// Registries are consulted once, when a [`Metric`](crate::collector::Metric)
/// is constructed; the metric keeps its own handle to the capability.
pub struct Device {
    hostname: String,
    resolvers: HashMap<String, Arc<dyn Resolver>>,
    modifiers: HashMap<String, Arc<dyn Modifier>>,
}

impl Device {
    /// Creates a device with the built-in `"default"` resolver and `"rate"`
    /// modifier registered.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self::bare(hostname)
            .with_resolver(DEFAULT_RESOLVER, IndexResolver)
            .with_modifier(RATE_MODIFIER, RateModifier::new())
    }

    /// Creates a device with empty registries.
    pub fn bare(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            resolvers: HashMap::new(),
            modifiers: HashMap::new(),
        }
    }

    /// Registers (or replaces) a resolver under `name`.
    pub fn with_resolver(mut self, name: impl Into<String>, resolver: impl Resolver + 'static) -> Self {
        self.resolvers.insert(name.into(), Arc::new(resolver));
        self
    }

    /// Registers (or replaces) a value modifier under `name`.
    pub fn with_modifier(mut self, name: impl Into<String>, modifier: impl Modifier + 'static) -> Self {
        self.modifiers.insert(name.into(), Arc::new(modifier));
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn resolver(&self, name: &str) -> Option<Arc<dyn Resolver>> {
        self.resolvers.get(name).cloned()
    }

    pub fn modifier(&self, name: &str) -> Option<Arc<dyn Modifier>> {
        self.modifiers.get(name).cloned()
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut resolvers: Vec<_> = self.resolvers.keys().collect();
        resolvers.sort();
        let mut modifiers: Vec<_> = self.modifiers.keys().collect();
        modifiers.sort();
        f.debug_struct("Device")
            .field("hostname", &self.hostname)
            .field("resolvers", &resolvers)
            .field("modifiers", &modifiers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_registers_builtins() {
        let device = Device::new("sw1");
        assert_eq!(device.hostname(), "sw1");
        assert!(device.resolver(DEFAULT_RESOLVER).is_some());
        assert!(device.modifier(RATE_MODIFIER).is_some());
        assert!(device.resolver("ifname").is_none());
    }

    #[test]
    fn bare_has_no_capabilities() {
        let device = Device::bare("sw1");
        assert!(device.resolver(DEFAULT_RESOLVER).is_none());
        assert!(device.modifier(RATE_MODIFIER).is_none());
    }
}
