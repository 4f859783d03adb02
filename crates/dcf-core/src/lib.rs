//! Core types for the default config filter
//!
//! This crate provides the small set of types shared by every other crate in
//! the workspace: the [`Context`] carried by service calls, the
//! [`ServiceCall`] itself, and the domain-name constants and grammar used to
//! decide which integrations can be disabled.

mod context;
pub mod domains;
mod service_call;

pub use context::Context;
pub use domains::{
    is_valid_domain_name, CONFIG_DOMAIN, DEFAULT_CONFIG_DOMAIN, DOMAIN, HA_DOMAIN,
    SERVICE_HOMEASSISTANT_RESTART,
};
pub use service_call::{ServiceCall, SupportsResponse};
