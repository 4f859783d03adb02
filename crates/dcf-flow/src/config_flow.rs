//! Config flow: creates the single default config filter entry

use dcf_core::DOMAIN;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::error::StepResult;
use crate::flow::{DomainFilterFlow, FlowMode, OptionsPayload};
use crate::host::EntryLookup;
use crate::manifest::ManifestSource;
use crate::result::FlowResult;
use crate::{ABORT_ALREADY_CONFIGURED, ENTRY_TITLE};

/// Creation-time behavior: nothing is disabled yet, and finishing creates
/// the entry unless one already exists.
struct NewEntry {
    entries: Arc<dyn EntryLookup>,
    unique_id: Option<String>,
}

impl NewEntry {
    fn abort_if_unique_id_configured(&self) -> Option<FlowResult> {
        let unique_id = self.unique_id.as_deref()?;
        if self.entries.is_configured(DOMAIN, unique_id) {
            debug!(unique_id = %unique_id, "Entry already configured");
            Some(FlowResult::abort(ABORT_ALREADY_CONFIGURED))
        } else {
            None
        }
    }
}

impl FlowMode for NewEntry {
    fn currently_disabled_domains(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn finalize(&self, options: OptionsPayload) -> FlowResult {
        if let Some(abort) = self.abort_if_unique_id_configured() {
            return abort;
        }
        FlowResult::create_entry(ENTRY_TITLE, HashMap::new(), options)
    }
}

/// Flow that sets up the integration
pub struct ConfigFlow {
    core: DomainFilterFlow,
    mode: NewEntry,
}

impl ConfigFlow {
    pub fn new(manifests: Arc<dyn ManifestSource>, entries: Arc<dyn EntryLookup>) -> Self {
        Self {
            core: DomainFilterFlow::new(manifests),
            mode: NewEntry {
                entries,
                unique_id: None,
            },
        }
    }

    /// Unique id claimed by this flow, once a step has run
    pub fn unique_id(&self) -> Option<&str> {
        self.mode.unique_id.as_deref()
    }

    /// Always empty: a new entry has nothing disabled yet
    pub fn currently_disabled_domains(&self) -> BTreeSet<String> {
        self.mode.currently_disabled_domains()
    }

    pub async fn base_dependencies(&mut self) -> Result<BTreeSet<String>, crate::FlowError> {
        self.core.base_dependencies().await
    }

    /// Interactive entry point
    pub async fn step_user(&mut self, user_input: Option<serde_json::Value>) -> StepResult {
        self.mode.unique_id = Some(DOMAIN.to_string());
        if let Some(abort) = self.mode.abort_if_unique_id_configured() {
            return Ok(abort);
        }

        self.core.run_user_step(&self.mode, user_input).await
    }

    /// Non-interactive entry point.
    ///
    /// The mapping is stored as the entry's options as-is; callers of the
    /// import step are trusted and no domain-name check is applied.
    pub async fn step_import(
        &mut self,
        user_input: serde_json::Map<String, serde_json::Value>,
    ) -> StepResult {
        self.mode.unique_id = Some(DOMAIN.to_string());
        Ok(self.mode.finalize(user_input.into_iter().collect()))
    }
}
