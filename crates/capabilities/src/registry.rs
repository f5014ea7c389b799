use buddy_core::{CapabilityResult, Error, ErrorKind, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    CalendarCapability, Capability, CapabilityContext, ConversationCapability, EmailCapability,
    SocialCapability, WeatherCapability,
};

/// Holds the capabilities attached to an agent. Names are unique; iteration
/// follows registration order. Immutable after startup by convention, so no
/// locking is needed on the read path.
pub struct CapabilityRegistry {
    order: Vec<String>,
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            capabilities: HashMap::new(),
        }
    }

    /// The standard capability set: weather, calendar, email, social, and the
    /// conversational fallback.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        // Registration cannot collide here; names are distinct literals.
        registry
            .register(Arc::new(WeatherCapability))
            .expect("default registration");
        registry
            .register(Arc::new(CalendarCapability))
            .expect("default registration");
        registry
            .register(Arc::new(EmailCapability))
            .expect("default registration");
        registry
            .register(Arc::new(SocialCapability))
            .expect("default registration");
        registry
            .register(Arc::new(ConversationCapability))
            .expect("default registration");
        registry
    }

    /// Attach a capability. Duplicate names are a programming-contract
    /// violation and fail fast at startup.
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<()> {
        let name = capability.schema().name;
        if self.capabilities.contains_key(name) {
            return Err(Error::DuplicateName(format!(
                "Capability '{}' is already registered",
                name
            )));
        }
        debug!(name, "Registering capability");
        self.order.push(name.to_string());
        self.capabilities.insert(name.to_string(), capability);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Arc<dyn Capability>> {
        self.capabilities
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Unknown capability: {}", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Registered names in registration order. Each call yields a fresh
    /// iterator.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Validate and execute a capability under a timeout budget.
    ///
    /// Capability-level failures (validation, timeout, provider trouble,
    /// handler errors) are folded into the returned `CapabilityResult`; the
    /// only `Err` this returns is `NotFound` for an unknown name.
    pub async fn invoke(
        &self,
        name: &str,
        ctx: CapabilityContext,
        params: Value,
        timeout: Duration,
    ) -> Result<CapabilityResult> {
        let capability = self.get(name)?;

        if let Err(e) = capability.validate(&params) {
            warn!(capability = name, error = %e, "Capability validation failed");
            return Ok(CapabilityResult::from_error(&e));
        }

        debug!(capability = name, "Executing capability");
        match tokio::time::timeout(timeout, capability.execute(ctx, params)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                warn!(capability = name, error = %e, "Capability execution failed");
                Ok(CapabilityResult::from_error(&e))
            }
            Err(_) => {
                warn!(capability = name, ?timeout, "Capability timed out");
                Ok(CapabilityResult::err(
                    ErrorKind::Timeout,
                    format!("Capability '{}' exceeded its {:?} budget", name, timeout),
                ))
            }
        }
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buddy_core::Config;
    use serde_json::json;

    fn ctx() -> CapabilityContext {
        CapabilityContext::synthetic(Config::default())
    }

    #[test]
    fn test_registry_new_empty() {
        let registry = CapabilityRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("weather").is_err());
    }

    #[test]
    fn test_with_defaults_registration_order() {
        let registry = CapabilityRegistry::with_defaults();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec!["weather", "calendar", "email", "social", "conversation"]
        );
        // restartable: a second pass sees the same sequence
        let again: Vec<&str> = registry.names().collect();
        assert_eq!(names, again);
    }

    #[test]
    fn test_get_returns_registered_instance() {
        let mut registry = CapabilityRegistry::new();
        let capability: Arc<dyn Capability> = Arc::new(WeatherCapability);
        registry.register(capability.clone()).unwrap();
        let fetched = registry.get("weather").unwrap();
        assert!(Arc::ptr_eq(&capability, fetched));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(WeatherCapability)).unwrap();
        let result = registry.register(Arc::new(WeatherCapability));
        assert!(matches!(result, Err(Error::DuplicateName(_))));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_invoke_unknown_capability_is_not_found() {
        let registry = CapabilityRegistry::with_defaults();
        let result = registry
            .invoke("teleport", ctx(), json!({}), Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invoke_validation_failure_is_structured() {
        let registry = CapabilityRegistry::with_defaults();
        // email requires `to`
        let result = registry
            .invoke("email", ctx(), json!({}), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error, Some(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn test_invoke_idempotent_on_synthetic_providers() {
        let registry = CapabilityRegistry::with_defaults();
        let params = json!({"city": "Paris"});
        let first = registry
            .invoke("weather", ctx(), params.clone(), Duration::from_secs(5))
            .await
            .unwrap();
        let second = registry
            .invoke("weather", ctx(), params, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(first.success, second.success);
        assert_eq!(first.message, second.message);
    }
}
