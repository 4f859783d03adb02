//! Service registry with async handlers
//!
//! The host exposes actions such as `homeassistant.restart` as services.
//! Flows never call the host directly; they go through a [`ServiceRegistry`]
//! so that tests and embedders can register their own handlers.

use dashmap::DashMap;
use dcf_core::{Context, ServiceCall, SupportsResponse};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Result type for service calls
pub type ServiceResult = Result<Option<serde_json::Value>, ServiceError>;

/// Future type for async service handlers
pub type ServiceFuture = Pin<Box<dyn Future<Output = ServiceResult> + Send>>;

/// Service handler function type
pub type ServiceHandler = Arc<dyn Fn(ServiceCall) -> ServiceFuture + Send + Sync>;

/// Errors that can occur when working with services
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("service not found: {domain}.{service}")]
    NotFound { domain: String, service: String },

    #[error("service call failed: {0}")]
    CallFailed(String),

    #[error("service does not support responses")]
    ResponseNotSupported,
}

struct RegisteredService {
    handler: ServiceHandler,
    supports_response: SupportsResponse,
}

/// Registry of callable services, keyed by `domain.service`
pub struct ServiceRegistry {
    services: DashMap<String, RegisteredService>,
}

impl ServiceRegistry {
    /// Create a new empty service registry
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Register a service handler, replacing any existing one
    #[instrument(skip(self, domain, service, handler))]
    pub fn register<F, Fut>(
        &self,
        domain: impl Into<String>,
        service: impl Into<String>,
        handler: F,
        supports_response: SupportsResponse,
    ) where
        F: Fn(ServiceCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServiceResult> + Send + 'static,
    {
        let domain = domain.into();
        let service = service.into();

        debug!(domain = %domain, service = %service, "Registering service");

        let handler: ServiceHandler =
            Arc::new(move |call| Box::pin(handler(call)) as ServiceFuture);

        self.services.insert(
            format!("{}.{}", domain, service),
            RegisteredService {
                handler,
                supports_response,
            },
        );
    }

    /// Call a service
    ///
    /// The registry entry is released before the handler runs, so a handler
    /// may itself register or call services.
    #[instrument(skip(self, service_data, context))]
    pub async fn call(
        &self,
        domain: &str,
        service: &str,
        service_data: serde_json::Value,
        context: Context,
        return_response: bool,
    ) -> ServiceResult {
        let key = format!("{}.{}", domain, service);

        let (handler, supports_response) = {
            let registered = self.services.get(&key).ok_or_else(|| {
                warn!(domain = %domain, service = %service, "Service not found");
                ServiceError::NotFound {
                    domain: domain.to_string(),
                    service: service.to_string(),
                }
            })?;
            (registered.handler.clone(), registered.supports_response)
        };

        if return_response && supports_response == SupportsResponse::None {
            return Err(ServiceError::ResponseNotSupported);
        }

        debug!(domain = %domain, service = %service, "Calling service");
        let result = handler(ServiceCall::new(domain, service, service_data, context)).await?;

        if return_response {
            Ok(result)
        } else {
            Ok(None)
        }
    }

    /// Check if a service exists
    pub fn has_service(&self, domain: &str, service: &str) -> bool {
        self.services.contains_key(&format!("{}.{}", domain, service))
    }

    /// Unregister a service
    pub fn unregister(&self, domain: &str, service: &str) -> bool {
        let removed = self
            .services
            .remove(&format!("{}.{}", domain, service))
            .is_some();

        if removed {
            debug!(domain = %domain, service = %service, "Unregistered service");
        }

        removed
    }

    /// Get total number of registered services
    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_register_and_call() {
        let registry = ServiceRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        registry.register(
            "homeassistant",
            "restart",
            move |_call: ServiceCall| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }
            },
            SupportsResponse::None,
        );

        let result = registry
            .call("homeassistant", "restart", json!({}), Context::new(), false)
            .await
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_call_with_response() {
        let registry = ServiceRegistry::new();
        registry.register(
            "test",
            "echo",
            |call: ServiceCall| async move { Ok(Some(call.service_data)) },
            SupportsResponse::Optional,
        );

        let result = registry
            .call("test", "echo", json!({"msg": "hi"}), Context::new(), true)
            .await
            .unwrap();
        assert_eq!(result, Some(json!({"msg": "hi"})));
    }

    #[tokio::test]
    async fn test_service_not_found() {
        let registry = ServiceRegistry::new();

        let result = registry
            .call("homeassistant", "restart", json!({}), Context::new(), false)
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_response_not_supported() {
        let registry = ServiceRegistry::new();
        registry.register(
            "homeassistant",
            "restart",
            |_: ServiceCall| async { Ok(None) },
            SupportsResponse::None,
        );

        let result = registry
            .call("homeassistant", "restart", json!({}), Context::new(), true)
            .await;
        assert!(matches!(result, Err(ServiceError::ResponseNotSupported)));
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let registry = ServiceRegistry::new();
        registry.register(
            "homeassistant",
            "restart",
            |_: ServiceCall| async { Err(ServiceError::CallFailed("config invalid".into())) },
            SupportsResponse::None,
        );

        let result = registry
            .call("homeassistant", "restart", json!({}), Context::new(), false)
            .await;
        assert!(matches!(result, Err(ServiceError::CallFailed(_))));
    }

    #[test]
    fn test_has_service_and_unregister() {
        let registry = ServiceRegistry::new();
        registry.register(
            "homeassistant",
            "restart",
            |_: ServiceCall| async { Ok(None) },
            SupportsResponse::None,
        );

        assert!(registry.has_service("homeassistant", "restart"));
        assert!(!registry.has_service("homeassistant", "stop"));
        assert_eq!(registry.service_count(), 1);

        assert!(registry.unregister("homeassistant", "restart"));
        assert!(!registry.unregister("homeassistant", "restart"));
        assert!(!registry.has_service("homeassistant", "restart"));
    }
}
