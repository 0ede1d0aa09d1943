//! Provider registry.
//!
//! The [`ProviderRegistry`] maps provider names to factories, so callers pick
//! a provider by configuration (`get_provider("ibm", ..)`) without naming
//! concrete adapter types.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HalError, HalResult};
use crate::provider::Provider;

/// Configuration handed to a provider factory.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API endpoint URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Authentication token override.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Additional configuration.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProviderConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the authentication token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Add extra configuration.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Look up an extra string value.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("extra", &self.extra)
            .finish()
    }
}

type ProviderFactory = Box<dyn Fn(&ProviderConfig) -> HalResult<Box<dyn Provider>> + Send + Sync>;

/// Central registry of provider factories.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: FxHashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider factory under `name`, replacing any previous one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&ProviderConfig) -> HalResult<Box<dyn Provider>> + Send + Sync + 'static,
    ) {
        let name = name.into();
        debug!("Registering provider: {}", name);
        self.factories.insert(name, Box::new(factory));
    }

    /// Instantiate the provider registered as `name`.
    pub fn get_provider(&self, name: &str, config: &ProviderConfig) -> HalResult<Box<dyn Provider>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            HalError::Configuration(format!(
                "unknown provider '{}', available: {}",
                name,
                self.available().join(", ")
            ))
        })?;
        debug!("Creating provider: {}", name);
        factory(config)
    }

    /// Registered provider names, sorted.
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<_> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::provider::BackendDescriptor;
    use async_trait::async_trait;

    struct EmptyProvider;

    #[async_trait]
    impl Provider for EmptyProvider {
        fn name(&self) -> &str {
            "empty"
        }

        async fn load_account(&self) -> HalResult<()> {
            Ok(())
        }

        async fn list_backends(&self) -> HalResult<Vec<BackendDescriptor>> {
            Ok(vec![])
        }

        async fn backend(&self, name: &str) -> HalResult<Box<dyn Backend>> {
            Err(HalError::Configuration(format!("no backend {name}")))
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ProviderRegistry::new();
        registry.register("empty", |_| Ok(Box::new(EmptyProvider)));

        assert!(registry.contains("empty"));
        let provider = registry.get_provider("empty", &ProviderConfig::new()).unwrap();
        assert_eq!(provider.name(), "empty");
    }

    #[test]
    fn test_unknown_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register("b", |_| Ok(Box::new(EmptyProvider)));
        registry.register("a", |_| Ok(Box::new(EmptyProvider)));

        let err = registry
            .get_provider("missing", &ProviderConfig::new())
            .err()
            .unwrap();
        assert!(matches!(err, HalError::Configuration(ref msg) if msg.contains("a, b")));
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = ProviderConfig::new()
            .with_token("secret-token")
            .with_extra("instance", serde_json::json!("crn:v1"));
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(config.extra_str("instance"), Some("crn:v1"));
    }
}
