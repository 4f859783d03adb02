//! Service call type

use crate::Context;
use serde::{Deserialize, Serialize};

/// A call to a host service, such as `homeassistant.restart`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    /// The domain the service belongs to (e.g., "homeassistant")
    pub domain: String,

    /// The service name (e.g., "restart")
    pub service: String,

    /// Data passed to the service
    pub service_data: serde_json::Value,

    /// Context tracking who initiated this call
    pub context: Context,
}

impl ServiceCall {
    /// Create a new service call
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        service_data: serde_json::Value,
        context: Context,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            service_data,
            context,
        }
    }

    /// Create a service call with empty service data
    pub fn simple(domain: impl Into<String>, service: impl Into<String>, context: Context) -> Self {
        Self::new(
            domain,
            service,
            serde_json::Value::Object(Default::default()),
            context,
        )
    }

    /// Get the full service identifier (domain.service)
    pub fn service_id(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }
}

/// Whether a service supports returning a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportsResponse {
    /// Service never returns a response
    #[default]
    None,
    /// Service may optionally return a response
    Optional,
    /// Service always returns a response
    Only,
}
