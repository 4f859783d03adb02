//! YAML configuration for the default config filter
//!
//! Users who keep their setup in `configuration.yaml` can declare the
//! disabled domains there instead of going through the UI:
//!
//! ```yaml
//! default_config_filter:
//!   zeroconf: true
//!   ssdp: false
//! ```
//!
//! or, as a shorthand, a list of domains to disable:
//!
//! ```yaml
//! default_config_filter: [zeroconf, ssdp]
//! ```
//!
//! The section is turned into the raw mapping handed to the config flow's
//! import step.
//!
//! # Example
//!
//! ```ignore
//! use dcf_config::FilterConfig;
//!
//! if let Some(config) = FilterConfig::load("/config")? {
//!     let input = config.import_input();
//! }
//! ```

mod error;
mod filter;

pub use error::{ConfigError, ConfigResult};
pub use filter::{FilterConfig, CONFIGURATION_FILE};
