//! Default config filter flows
//!
//! The `default_config` bundle pulls in a fixed list of integrations. This
//! crate implements the config flow and options flow that let a user pick
//! which of those integrations to disable, plus any extra domains typed in
//! by hand. The result is stored as the options of a single config entry,
//! `{domain: true}` for every disabled domain.
//!
//! # Flows
//!
//! - [`ConfigFlow`] creates the (singleton) entry, interactively or through
//!   the `import` step.
//! - [`OptionsFlow`] edits an existing entry, offering a host restart
//!   instead when the entry is not running.
//! - [`FlowManager`] tracks in-progress flows by id and applies their
//!   results to [`dcf_config_entries::ConfigEntries`].
//!
//! Both flows share one step, [`DomainFilterFlow::run_user_step`], which is
//! parameterized by a [`FlowMode`].

pub mod config_flow;
pub mod error;
pub mod flow;
pub mod host;
pub mod manager;
pub mod manifest;
pub mod options_flow;
pub mod result;
pub mod validation;

pub use config_flow::ConfigFlow;
pub use error::{FlowError, StepResult};
pub use flow::{disabled_options, DomainFilterFlow, FlowMode, OptionsPayload};
pub use host::{EntryLookup, RestartRequester};
pub use manager::{FlowHandler, FlowManager, FlowSource};
pub use manifest::{
    extract_manifest_dependencies, FileManifestSource, IntegrationManifest, ManifestError,
    ManifestSource, StaticManifestSource,
};
pub use options_flow::OptionsFlow;
pub use result::{CreatedEntry, FieldKind, FlowForm, FlowResponse, FlowResult, FormField};
pub use validation::{parse_extra_domains, InvalidDomains};

/// Multi-select of domains to disable
pub const CONF_DISABLED_DOMAINS: &str = "disabled_domains";
/// Free-text, comma-separated extra domains to disable
pub const CONF_EXTRA_DOMAINS: &str = "extra_domains";
/// "Configure anyway" toggle shown for inactive entries
pub const CONF_CONFIGURE_DOMAINS: &str = "configure_domains";

/// Description placeholder listing rejected extra domains
pub const FMT_FAILED_DOMAINS: &str = "failed_domains";

/// Field error for malformed extra domains
pub const ERROR_INVALID_FORMAT: &str = "invalid_format";

pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";
pub const ABORT_RESTART_PENDING: &str = "restart_pending";

pub const STEP_USER: &str = "user";
pub const STEP_INIT: &str = "init";
pub const STEP_IMPORT: &str = "import";

/// Title of the entry created by the config flow
pub const ENTRY_TITLE: &str = "Default Config Override";
