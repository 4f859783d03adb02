//! Flow errors
//!
//! Validation problems and duplicate configuration are not errors: they are
//! reported as a form with field errors or as an abort result. A
//! [`FlowError`] means a collaborator failed or the caller misused the flow.

use dcf_config_entries::ConfigEntriesError;
use dcf_service_registry::ServiceError;
use thiserror::Error;

use crate::manifest::ManifestError;
use crate::result::FlowResult;

/// Result of running a single flow step
pub type StepResult = Result<FlowResult, FlowError>;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    ConfigEntries(#[from] ConfigEntriesError),

    #[error("invalid user input: {0}")]
    InvalidInput(String),

    #[error("flow not found: {0}")]
    UnknownFlow(String),

    #[error("config entry not found: {0}")]
    UnknownEntry(String),

    #[error("flow has no step '{0}'")]
    UnknownStep(String),
}
