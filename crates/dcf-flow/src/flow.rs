//! The shared "choose domains" step
//!
//! [`DomainFilterFlow`] holds what both flows have in common: the cached base
//! dependency set and the `user` step. What differs between creating an
//! entry and editing one is injected through [`FlowMode`].

use dcf_core::{is_valid_domain_name, CONFIG_DOMAIN};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{FlowError, StepResult};
use crate::manifest::{extract_manifest_dependencies, ManifestSource};
use crate::result::{FlowForm, FlowResult, FormField};
use crate::validation::parse_extra_domains;
use crate::{
    CONF_DISABLED_DOMAINS, CONF_EXTRA_DOMAINS, ERROR_INVALID_FORMAT, FMT_FAILED_DOMAINS,
    STEP_USER,
};

/// Options stored on the config entry: domain → disabled
pub type OptionsPayload = HashMap<String, serde_json::Value>;

/// Encode a set of disabled domains as entry options
pub fn disabled_options<I>(domains: I) -> OptionsPayload
where
    I: IntoIterator<Item = String>,
{
    domains
        .into_iter()
        .map(|domain| (domain, serde_json::Value::Bool(true)))
        .collect()
}

/// Behavior that differs between the config flow and the options flow
pub trait FlowMode: Send + Sync {
    /// Domains disabled before this flow started
    fn currently_disabled_domains(&self) -> BTreeSet<String>;

    /// Turn the chosen options into the flow's final result
    fn finalize(&self, options: OptionsPayload) -> FlowResult;
}

/// Submitted `user` step data
#[derive(Debug, Default, Deserialize)]
struct DomainSelection {
    #[serde(default)]
    disabled_domains: Vec<String>,
    #[serde(default)]
    extra_domains: Option<String>,
}

/// Normalize step input: a missing value, `null` and `{}` all mean the form
/// has not been submitted yet.
pub(crate) fn submitted(
    user_input: Option<serde_json::Value>,
) -> Result<Option<serde_json::Map<String, serde_json::Value>>, FlowError> {
    match user_input {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(None),
        Some(serde_json::Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(FlowError::InvalidInput(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Truthiness of a stored option value
pub(crate) fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}

/// Read a form toggle.
///
/// Accepts booleans, numbers, and the usual on/off words; anything else is
/// invalid input rather than being coerced by truthiness.
pub(crate) fn parse_toggle(name: &str, value: &serde_json::Value) -> Result<bool, FlowError> {
    let invalid = || FlowError::InvalidInput(format!("{} is not a boolean: {}", name, value));

    match value {
        serde_json::Value::Bool(b) => Ok(*b),
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).ok_or_else(invalid),
        serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" | "enable" => Ok(true),
            "0" | "false" | "no" | "off" | "disable" => Ok(false),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

/// Reject multi-select values the form could not have offered.
///
/// Already-disabled domains are always accepted so that an imported entry
/// can be re-submitted unchanged. Anything else must be a well-formed
/// domain other than `config`.
fn check_selected_domains(
    selected: &[String],
    currently_disabled: &BTreeSet<String>,
) -> Result<(), FlowError> {
    let rejected: Vec<&str> = selected
        .iter()
        .filter(|domain| !currently_disabled.contains(domain.as_str()))
        .filter(|domain| domain.as_str() == CONFIG_DOMAIN || !is_valid_domain_name(domain))
        .map(String::as_str)
        .collect();

    if rejected.is_empty() {
        Ok(())
    } else {
        Err(FlowError::InvalidInput(format!(
            "{} contains domains that cannot be disabled: {}",
            CONF_DISABLED_DOMAINS,
            rejected.join(", ")
        )))
    }
}

/// State shared by both flows
pub struct DomainFilterFlow {
    manifests: Arc<dyn ManifestSource>,
    /// Filled on first use and kept for the life of the flow
    base_dependencies: Option<BTreeSet<String>>,
}

impl DomainFilterFlow {
    pub fn new(manifests: Arc<dyn ManifestSource>) -> Self {
        Self {
            manifests,
            base_dependencies: None,
        }
    }

    /// Dependencies of the unpatched `default_config` manifest, minus
    /// `config`.
    pub async fn base_dependencies(&mut self) -> Result<BTreeSet<String>, FlowError> {
        if let Some(deps) = &self.base_dependencies {
            return Ok(deps.clone());
        }

        let manifest = self.manifests.original_manifest().await?;
        let mut deps = extract_manifest_dependencies(&manifest);
        deps.remove(CONFIG_DOMAIN);

        debug!(count = deps.len(), "Cached base dependencies");
        self.base_dependencies = Some(deps.clone());
        Ok(deps)
    }

    /// Run the `user` step.
    ///
    /// Without input, shows the form. With input, commits the selection
    /// plus the extra domains, or re-shows the form with the input kept as
    /// defaults when any extra domain is malformed.
    pub async fn run_user_step<M>(
        &mut self,
        mode: &M,
        user_input: Option<serde_json::Value>,
    ) -> StepResult
    where
        M: FlowMode + ?Sized,
    {
        let selection = match submitted(user_input)? {
            Some(map) => Some(
                serde_json::from_value::<DomainSelection>(serde_json::Value::Object(map))
                    .map_err(|e| FlowError::InvalidInput(e.to_string()))?,
            ),
            None => None,
        };

        let mut form = FlowForm::new(STEP_USER, Vec::new());

        if let Some(selection) = &selection {
            check_selected_domains(
                &selection.disabled_domains,
                &mode.currently_disabled_domains(),
            )?;

            let mut disabled: BTreeSet<String> =
                selection.disabled_domains.iter().cloned().collect();

            if let Some(text) = selection.extra_domains.as_deref().filter(|t| !t.is_empty()) {
                match parse_extra_domains(text) {
                    Ok(extra) => disabled.extend(extra),
                    Err(invalid) => {
                        warn!(failed = %invalid.placeholder(), "Rejected extra domains");
                        form.errors
                            .insert(CONF_EXTRA_DOMAINS.into(), ERROR_INVALID_FORMAT.into());
                        form.description_placeholders
                            .insert(FMT_FAILED_DOMAINS.into(), invalid.placeholder());
                    }
                }
            }

            if form.errors.is_empty() {
                return Ok(mode.finalize(disabled_options(disabled)));
            }
        }

        let selection = selection.unwrap_or_default();

        let mut currently_disabled = mode.currently_disabled_domains();
        currently_disabled.extend(selection.disabled_domains.iter().cloned());

        let mut all_domains = self.base_dependencies().await?;
        all_domains.extend(currently_disabled.iter().cloned());

        form.data_schema = vec![
            FormField::multi_select(
                CONF_DISABLED_DOMAINS,
                all_domains.into_iter().collect(),
                currently_disabled.into_iter().collect(),
            ),
            FormField::string(
                CONF_EXTRA_DOMAINS,
                selection.extra_domains.unwrap_or_default(),
            ),
        ];

        Ok(FlowResult::Form(form))
    }
}
