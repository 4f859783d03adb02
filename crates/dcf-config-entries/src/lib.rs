//! Config Entries
//!
//! A config entry is the host's record of one configured integration
//! instance. For the default config filter there is at most one entry, and
//! its `options` hold the disabled-domain mapping.
//!
//! # Key Types
//!
//! - [`ConfigEntry`] - A single integration configuration
//! - [`ConfigEntryState`] - Lifecycle state of an entry
//! - [`ConfigEntries`] - Manager for all config entries

pub mod entry;
pub mod manager;
pub mod state_machine;

pub use entry::{ConfigEntry, ConfigEntrySource, ConfigEntryState, ConfigEntryUpdate};
pub use manager::{ConfigEntries, ConfigEntriesError, ConfigEntriesResult, SetupHandler};
pub use state_machine::InvalidTransition;
