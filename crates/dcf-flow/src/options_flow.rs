//! Options flow: edits the disabled domains of an existing entry

use dcf_config_entries::ConfigEntry;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::error::StepResult;
use crate::flow::{
    is_truthy, parse_toggle, submitted, DomainFilterFlow, FlowMode, OptionsPayload,
};
use crate::host::RestartRequester;
use crate::manifest::ManifestSource;
use crate::result::{FlowForm, FlowResult, FormField};
use crate::{ABORT_RESTART_PENDING, CONF_CONFIGURE_DOMAINS, STEP_INIT};

/// Edit-time behavior: start from the entry's options, finish by replacing
/// them.
struct ExistingEntry {
    entry: ConfigEntry,
}

impl FlowMode for ExistingEntry {
    fn currently_disabled_domains(&self) -> BTreeSet<String> {
        self.entry
            .options
            .iter()
            .filter(|(_, value)| is_truthy(value))
            .map(|(domain, _)| domain.clone())
            .collect()
    }

    fn finalize(&self, options: OptionsPayload) -> FlowResult {
        debug!(entry_id = %self.entry.entry_id, ?options, "Will save options entry data");
        FlowResult::create_entry("", HashMap::new(), options)
    }
}

/// Flow that edits an existing entry
pub struct OptionsFlow {
    core: DomainFilterFlow,
    mode: ExistingEntry,
    restart: Arc<dyn RestartRequester>,
}

impl OptionsFlow {
    /// Create a flow over a snapshot of `entry`
    pub fn new(
        entry: ConfigEntry,
        manifests: Arc<dyn ManifestSource>,
        restart: Arc<dyn RestartRequester>,
    ) -> Self {
        Self {
            core: DomainFilterFlow::new(manifests),
            mode: ExistingEntry { entry },
            restart,
        }
    }

    pub fn entry(&self) -> &ConfigEntry {
        &self.mode.entry
    }

    /// Keys of the entry's options with a truthy value
    pub fn currently_disabled_domains(&self) -> BTreeSet<String> {
        self.mode.currently_disabled_domains()
    }

    pub async fn base_dependencies(&mut self) -> Result<BTreeSet<String>, crate::FlowError> {
        self.core.base_dependencies().await
    }

    /// First step.
    ///
    /// When the entry is not loaded or failed to set up, changing options
    /// has no live effect, so the user is first asked whether to configure
    /// anyway. Declining requests a restart and aborts the flow.
    pub async fn step_init(&mut self, user_input: Option<serde_json::Value>) -> StepResult {
        if self.mode.entry.state.is_inactive() {
            match submitted(user_input)? {
                None => {
                    debug!(state = ?self.mode.entry.state, "Entry inactive, asking to confirm");
                    return Ok(FlowResult::Form(FlowForm::new(
                        STEP_INIT,
                        vec![FormField::boolean(CONF_CONFIGURE_DOMAINS, false)],
                    )));
                }
                Some(input) => {
                    let configure = match input.get(CONF_CONFIGURE_DOMAINS) {
                        Some(value) => parse_toggle(CONF_CONFIGURE_DOMAINS, value)?,
                        None => false,
                    };
                    if !configure {
                        self.restart.request_restart().await?;
                        return Ok(FlowResult::abort(ABORT_RESTART_PENDING));
                    }
                }
            }
        }

        self.step_user(None).await
    }

    /// The shared domain selection step
    pub async fn step_user(&mut self, user_input: Option<serde_json::Value>) -> StepResult {
        self.core.run_user_step(&self.mode, user_input).await
    }
}
