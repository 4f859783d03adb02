//! Flow Manager
//!
//! Tracks in-progress flows by id, routes input to the step each flow is
//! waiting on, and applies finished flows to the config entries.

use async_trait::async_trait;
use dcf_config::FilterConfig;
use dcf_config_entries::{ConfigEntries, ConfigEntry, ConfigEntrySource, ConfigEntryUpdate};
use dcf_core::DOMAIN;
use dcf_service_registry::ServiceRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use ulid::Ulid;

use crate::config_flow::ConfigFlow;
use crate::error::FlowError;
use crate::flow::submitted;
use crate::manifest::ManifestSource;
use crate::options_flow::OptionsFlow;
use crate::result::{CreatedEntry, FlowResponse, FlowResult};
use crate::{STEP_IMPORT, STEP_INIT, STEP_USER};

/// How a config flow was started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSource {
    /// Started from the UI
    User,
    /// Started from YAML configuration
    Import,
}

impl From<FlowSource> for ConfigEntrySource {
    fn from(source: FlowSource) -> Self {
        match source {
            FlowSource::User => ConfigEntrySource::User,
            FlowSource::Import => ConfigEntrySource::Import,
        }
    }
}

enum FlowKind {
    Config {
        flow: ConfigFlow,
        source: FlowSource,
    },
    Options(OptionsFlow),
}

/// Active flow state
struct ActiveFlow {
    /// Integration domain, or the entry id for options flows
    handler: String,
    kind: FlowKind,
    /// Step waiting for input
    current_step: String,
}

/// Entry points a REST or WebSocket API calls into
#[async_trait]
pub trait FlowHandler: Send + Sync {
    /// Start a config flow
    async fn start_flow(
        &self,
        source: FlowSource,
        user_input: Option<serde_json::Value>,
    ) -> Result<FlowResponse, FlowError>;

    /// Start an options flow for an existing entry
    async fn start_options_flow(&self, entry_id: &str) -> Result<FlowResponse, FlowError>;

    /// Continue a flow with user input
    async fn progress_flow(
        &self,
        flow_id: &str,
        user_input: Option<serde_json::Value>,
    ) -> Result<FlowResponse, FlowError>;

    /// List in-progress flows
    async fn list_flows(&self) -> Vec<serde_json::Value>;
}

/// Manages active flows for the default config filter
pub struct FlowManager {
    manifests: Arc<dyn ManifestSource>,
    entries: Arc<ConfigEntries>,
    services: Arc<ServiceRegistry>,
    flows: RwLock<HashMap<String, ActiveFlow>>,
}

impl FlowManager {
    pub fn new(
        manifests: Arc<dyn ManifestSource>,
        entries: Arc<ConfigEntries>,
        services: Arc<ServiceRegistry>,
    ) -> Self {
        Self {
            manifests,
            entries,
            services,
            flows: RwLock::new(HashMap::new()),
        }
    }

    /// Import YAML configuration, if any, through the config flow.
    ///
    /// Returns `None` when there is nothing to import.
    pub async fn setup_from_config(
        &self,
        config: Option<&FilterConfig>,
    ) -> Result<Option<FlowResponse>, FlowError> {
        let Some(config) = config else {
            return Ok(None);
        };

        let input = serde_json::Value::Object(config.import_input());
        self.start_flow(FlowSource::Import, Some(input))
            .await
            .map(Some)
    }

    /// Number of in-progress flows
    pub async fn len(&self) -> usize {
        self.flows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.flows.read().await.is_empty()
    }

    async fn run_step(
        &self,
        active: &mut ActiveFlow,
        user_input: Option<serde_json::Value>,
    ) -> Result<FlowResult, FlowError> {
        debug!(handler = %active.handler, step = %active.current_step, "Running flow step");

        match (&mut active.kind, active.current_step.as_str()) {
            (FlowKind::Config { flow, .. }, STEP_USER) => flow.step_user(user_input).await,
            (FlowKind::Config { flow, .. }, STEP_IMPORT) => {
                let input = submitted(user_input)?.unwrap_or_default();
                flow.step_import(input).await
            }
            (FlowKind::Options(flow), STEP_INIT) => flow.step_init(user_input).await,
            (FlowKind::Options(flow), STEP_USER) => flow.step_user(user_input).await,
            (_, step) => Err(FlowError::UnknownStep(step.to_string())),
        }
    }

    /// Persist a finished flow's entry and return it as JSON
    fn apply_created(
        &self,
        active: &ActiveFlow,
        created: &CreatedEntry,
    ) -> Result<serde_json::Value, FlowError> {
        let entry = match &active.kind {
            FlowKind::Config { flow, source } => {
                let mut entry = ConfigEntry::new(DOMAIN, created.title.clone())
                    .with_data(created.data.clone())
                    .with_options(created.options.clone())
                    .with_source((*source).into());
                if let Some(unique_id) = flow.unique_id() {
                    entry = entry.with_unique_id(unique_id);
                }
                self.entries.add(entry)?
            }
            FlowKind::Options(flow) => {
                let entry_id = flow.entry().entry_id.clone();
                let updated = self.entries.update(
                    &entry_id,
                    ConfigEntryUpdate::new().options(created.options.clone()),
                )?;
                info!(entry_id = %entry_id, "Updated options");
                updated
            }
        };

        Ok(serde_json::json!({
            "entry_id": entry.entry_id,
            "domain": entry.domain,
            "title": entry.title,
            "source": entry.source.as_str(),
            "options": entry.options,
        }))
    }

    /// Run the current step and either keep the flow or finish it
    async fn advance(
        &self,
        flow_id: String,
        mut active: ActiveFlow,
        user_input: Option<serde_json::Value>,
    ) -> Result<FlowResponse, FlowError> {
        let result = self.run_step(&mut active, user_input).await;

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                self.flows.write().await.insert(flow_id, active);
                return Err(e);
            }
        };

        let response = FlowResponse::new(flow_id.clone(), active.handler.clone(), &result);

        match &result {
            FlowResult::Form(form) => {
                active.current_step = form.step_id.clone();
                self.flows.write().await.insert(flow_id, active);
                Ok(response)
            }
            FlowResult::CreateEntry(created) => {
                let entry = self.apply_created(&active, created)?;
                debug!(flow_id = %flow_id, "Flow finished");
                Ok(response.with_result(entry))
            }
            FlowResult::Abort { reason } => {
                debug!(flow_id = %flow_id, reason = %reason, "Flow aborted");
                Ok(response)
            }
        }
    }
}

#[async_trait]
impl FlowHandler for FlowManager {
    async fn start_flow(
        &self,
        source: FlowSource,
        user_input: Option<serde_json::Value>,
    ) -> Result<FlowResponse, FlowError> {
        let flow_id = Ulid::new().to_string();
        let flow = ConfigFlow::new(self.manifests.clone(), self.entries.clone());
        let current_step = match source {
            FlowSource::User => STEP_USER,
            FlowSource::Import => STEP_IMPORT,
        };

        info!(flow_id = %flow_id, ?source, "Starting config flow");

        let active = ActiveFlow {
            handler: DOMAIN.to_string(),
            kind: FlowKind::Config { flow, source },
            current_step: current_step.to_string(),
        };
        self.advance(flow_id, active, user_input).await
    }

    async fn start_options_flow(&self, entry_id: &str) -> Result<FlowResponse, FlowError> {
        let entry = self
            .entries
            .get(entry_id)
            .ok_or_else(|| FlowError::UnknownEntry(entry_id.to_string()))?;

        let flow_id = Ulid::new().to_string();
        info!(flow_id = %flow_id, entry_id = %entry_id, "Starting options flow");

        let flow = OptionsFlow::new(entry, self.manifests.clone(), self.services.clone());
        let active = ActiveFlow {
            handler: entry_id.to_string(),
            kind: FlowKind::Options(flow),
            current_step: STEP_INIT.to_string(),
        };
        self.advance(flow_id, active, None).await
    }

    async fn progress_flow(
        &self,
        flow_id: &str,
        user_input: Option<serde_json::Value>,
    ) -> Result<FlowResponse, FlowError> {
        let active = self
            .flows
            .write()
            .await
            .remove(flow_id)
            .ok_or_else(|| FlowError::UnknownFlow(flow_id.to_string()))?;

        self.advance(flow_id.to_string(), active, user_input).await
    }

    async fn list_flows(&self) -> Vec<serde_json::Value> {
        self.flows
            .read()
            .await
            .iter()
            .map(|(flow_id, active)| {
                let source = match &active.kind {
                    FlowKind::Config { source, .. } => ConfigEntrySource::from(*source).as_str(),
                    FlowKind::Options(_) => "options",
                };
                serde_json::json!({
                    "flow_id": flow_id,
                    "handler": active.handler,
                    "step_id": active.current_step,
                    "context": {"source": source},
                })
            })
            .collect()
    }
}
