//! Host collaborators used by the flows
//!
//! The manifest collaborator lives in [`crate::manifest`]. The other two are
//! implemented here for the workspace's own service registry and config
//! entries manager.

use async_trait::async_trait;
use dcf_config_entries::ConfigEntries;
use dcf_core::{Context, HA_DOMAIN, SERVICE_HOMEASSISTANT_RESTART};
use dcf_service_registry::{ServiceError, ServiceRegistry};
use tracing::warn;

/// Asks the host to restart
#[async_trait]
pub trait RestartRequester: Send + Sync {
    async fn request_restart(&self) -> Result<(), ServiceError>;
}

#[async_trait]
impl RestartRequester for ServiceRegistry {
    async fn request_restart(&self) -> Result<(), ServiceError> {
        warn!("Requesting host restart");
        self.call(
            HA_DOMAIN,
            SERVICE_HOMEASSISTANT_RESTART,
            serde_json::json!({}),
            Context::new(),
            false,
        )
        .await
        .map(|_| ())
    }
}

/// Answers whether an entry with a given unique id already exists
pub trait EntryLookup: Send + Sync {
    fn is_configured(&self, domain: &str, unique_id: &str) -> bool;
}

impl EntryLookup for ConfigEntries {
    fn is_configured(&self, domain: &str, unique_id: &str) -> bool {
        self.get_by_unique_id(domain, unique_id).is_some()
    }
}
