//! Config Entries Manager
//!
//! Keeps the host's config entries in memory, indexed by domain and by
//! `(domain, unique_id)`, and drives their setup/unload lifecycle.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::entry::{ConfigEntry, ConfigEntryState, ConfigEntryUpdate};
use crate::state_machine::InvalidTransition;

/// Config entries errors
#[derive(Debug, Error)]
pub enum ConfigEntriesError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Entry already exists for domain {domain} with unique_id {unique_id}")]
    AlreadyExists { domain: String, unique_id: String },

    #[error("Cannot unload entry in state {0:?}")]
    CannotUnload(ConfigEntryState),

    #[error("Setup failed: {0}")]
    SetupFailed(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

pub type ConfigEntriesResult<T> = Result<T, ConfigEntriesError>;

/// Setup handler function type
pub type SetupHandler = Arc<dyn Fn(&ConfigEntry) -> Result<(), String> + Send + Sync + 'static>;

/// Config Entries Manager
pub struct ConfigEntries {
    /// Primary index: entry_id -> ConfigEntry
    entries: DashMap<String, ConfigEntry>,

    /// Index: domain -> set of entry_ids
    by_domain: DashMap<String, HashSet<String>>,

    /// Index: (domain, unique_id) -> entry_id
    by_unique_id: DashMap<(String, String), String>,

    /// Serializes setup/unload
    setup_lock: Mutex<()>,

    /// Setup handlers by domain
    setup_handlers: DashMap<String, SetupHandler>,
}

impl ConfigEntries {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            by_domain: DashMap::new(),
            by_unique_id: DashMap::new(),
            setup_lock: Mutex::new(()),
            setup_handlers: DashMap::new(),
        }
    }

    /// Index an entry whose unique id, if any, is already claimed
    fn index_entry(&self, entry: &ConfigEntry) {
        let entry_id = entry.entry_id.clone();

        self.entries.insert(entry_id.clone(), entry.clone());

        self.by_domain
            .entry(entry.domain.clone())
            .or_default()
            .insert(entry_id);
    }

    fn unindex_entry(&self, entry: &ConfigEntry) {
        if let Some(mut ids) = self.by_domain.get_mut(&entry.domain) {
            ids.remove(&entry.entry_id);
        }

        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id
                .remove(&(entry.domain.clone(), unique_id.clone()));
        }

        self.entries.remove(&entry.entry_id);
    }

    /// Get an entry by ID
    pub fn get(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.entries.get(entry_id).map(|r| r.value().clone())
    }

    /// Get all entries for a domain
    pub fn get_by_domain(&self, domain: &str) -> Vec<ConfigEntry> {
        self.by_domain
            .get(domain)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    /// Get entry by unique_id
    pub fn get_by_unique_id(&self, domain: &str, unique_id: &str) -> Option<ConfigEntry> {
        self.by_unique_id
            .get(&(domain.to_string(), unique_id.to_string()))
            .and_then(|entry_id| self.get(&entry_id))
    }

    /// Add a new config entry
    pub fn add(&self, entry: ConfigEntry) -> ConfigEntriesResult<ConfigEntry> {
        // Claim the unique id under the shard lock so concurrent adds
        // cannot both pass the check.
        if let Some(ref unique_id) = entry.unique_id {
            match self
                .by_unique_id
                .entry((entry.domain.clone(), unique_id.clone()))
            {
                dashmap::mapref::entry::Entry::Occupied(_) => {
                    return Err(ConfigEntriesError::AlreadyExists {
                        domain: entry.domain.clone(),
                        unique_id: unique_id.clone(),
                    });
                }
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    slot.insert(entry.entry_id.clone());
                }
            }
        }

        self.index_entry(&entry);

        info!(
            "Added config entry: {} ({}) [{}]",
            entry.title, entry.domain, entry.entry_id
        );

        Ok(entry)
    }

    /// Update an existing entry. Options are replaced wholesale.
    pub fn update(
        &self,
        entry_id: &str,
        update: ConfigEntryUpdate,
    ) -> ConfigEntriesResult<ConfigEntry> {
        let mut entry = self
            .entries
            .get_mut(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        if let Some(title) = update.title {
            entry.title = title;
        }
        if let Some(data) = update.data {
            entry.data = data;
        }
        if let Some(options) = update.options {
            entry.options = options;
        }
        entry.modified_at = Utc::now();

        debug!("Updated config entry: {}", entry_id);
        Ok(entry.clone())
    }

    /// Remove an entry
    pub fn remove(&self, entry_id: &str) -> ConfigEntriesResult<ConfigEntry> {
        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        self.unindex_entry(&entry);

        info!(
            "Removed config entry: {} ({}) [{}]",
            entry.title, entry.domain, entry_id
        );

        Ok(entry)
    }

    fn transition(
        &self,
        entry_id: &str,
        state: ConfigEntryState,
        reason: Option<String>,
    ) -> ConfigEntriesResult<()> {
        let mut entry = self
            .entries
            .get_mut(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        entry.try_set_state(state, reason)?;
        debug!("Entry {} state changed to {:?}", entry_id, state);
        Ok(())
    }

    /// Register a setup handler for a domain
    pub fn register_setup_handler(&self, domain: &str, handler: SetupHandler) {
        self.setup_handlers.insert(domain.to_string(), handler);
        debug!("Registered setup handler for domain: {}", domain);
    }

    /// Set up an entry by calling its domain's setup handler.
    ///
    /// Domains without a handler are marked loaded.
    pub async fn setup(&self, entry_id: &str) -> ConfigEntriesResult<()> {
        let _lock = self.setup_lock.lock().await;

        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        self.transition(entry_id, ConfigEntryState::SetupInProgress, None)?;

        let handler = self
            .setup_handlers
            .get(&entry.domain)
            .map(|h| h.value().clone());

        match handler.map(|handler| handler(&entry)) {
            Some(Err(reason)) => {
                warn!("Setup failed for entry {}: {}", entry_id, reason);
                self.transition(
                    entry_id,
                    ConfigEntryState::SetupError,
                    Some(reason.clone()),
                )?;
                Err(ConfigEntriesError::SetupFailed(reason))
            }
            _ => {
                self.transition(entry_id, ConfigEntryState::Loaded, None)?;
                info!("Setup completed for entry: {} ({})", entry.title, entry_id);
                Ok(())
            }
        }
    }

    /// Unload an entry
    pub async fn unload(&self, entry_id: &str) -> ConfigEntriesResult<()> {
        let _lock = self.setup_lock.lock().await;

        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        if entry.state == ConfigEntryState::NotLoaded {
            return Ok(());
        }
        if !entry.state.is_recoverable() {
            return Err(ConfigEntriesError::CannotUnload(entry.state));
        }

        self.transition(entry_id, ConfigEntryState::UnloadInProgress, None)?;
        self.transition(entry_id, ConfigEntryState::NotLoaded, None)?;

        info!("Unloaded entry: {} ({})", entry.title, entry_id);
        Ok(())
    }

    /// Get count of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ConfigEntries {
    fn default() -> Self {
        Self::new()
    }
}
