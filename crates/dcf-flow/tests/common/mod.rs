//! Common test utilities for the flow tests
//!
//! Mocks for the host collaborators: a manifest source that counts reads and
//! can change its answer between calls, a restart requester that records
//! calls, and an entry lookup with a fixed answer.

#![allow(dead_code)]

use async_trait::async_trait;
use dcf_config_entries::{ConfigEntry, ConfigEntryState};
use dcf_core::DOMAIN;
use dcf_flow::{EntryLookup, IntegrationManifest, ManifestError, ManifestSource, RestartRequester};
use dcf_service_registry::ServiceError;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn manifest(dependencies: &[&str]) -> IntegrationManifest {
    IntegrationManifest {
        domain: "default_config".to_string(),
        name: "Default Config".to_string(),
        integration_type: Some("system".to_string()),
        documentation: None,
        codeowners: vec![],
        dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        after_dependencies: vec![],
        quality_scale: None,
    }
}

/// Manifest source returning a queue of answers, repeating the last one
pub struct MockManifestSource {
    answers: Mutex<Vec<IntegrationManifest>>,
    reads: AtomicUsize,
    fail: bool,
}

impl MockManifestSource {
    pub fn new(dependencies: &[&str]) -> Arc<Self> {
        Self::sequence(vec![manifest(dependencies)])
    }

    pub fn sequence(answers: Vec<IntegrationManifest>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers),
            reads: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(vec![]),
            reads: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManifestSource for MockManifestSource {
    async fn original_manifest(&self) -> Result<IntegrationManifest, ManifestError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ManifestError::Read {
                path: PathBuf::from("default_config/manifest.json"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            });
        }

        let mut answers = self.answers.lock().unwrap();
        if answers.len() > 1 {
            Ok(answers.remove(0))
        } else {
            Ok(answers[0].clone())
        }
    }
}

/// Restart requester that counts calls
#[derive(Default)]
pub struct RecordingRestart {
    calls: AtomicUsize,
    fail: bool,
}

impl RecordingRestart {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RestartRequester for RecordingRestart {
    async fn request_restart(&self) -> Result<(), ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(ServiceError::CallFailed("restart refused".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Entry lookup with a fixed answer
pub struct FixedLookup(pub bool);

impl FixedLookup {
    pub fn configured() -> Arc<Self> {
        Arc::new(Self(true))
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self(false))
    }
}

impl EntryLookup for FixedLookup {
    fn is_configured(&self, _domain: &str, _unique_id: &str) -> bool {
        self.0
    }
}

/// A filter entry in the given state with the given options
pub fn filter_entry(state: ConfigEntryState, options: serde_json::Value) -> ConfigEntry {
    let options: HashMap<String, serde_json::Value> =
        serde_json::from_value(options).unwrap_or_default();
    let mut entry = ConfigEntry::new(DOMAIN, "Default Config Override")
        .with_unique_id(DOMAIN)
        .with_options(options);
    entry.state = state;
    entry
}

pub fn loaded_entry(options: serde_json::Value) -> ConfigEntry {
    filter_entry(ConfigEntryState::Loaded, options)
}

pub fn no_options() -> serde_json::Value {
    json!({})
}
