//! Integration manifests
//!
//! The base dependency list comes from the `default_config` integration's
//! `manifest.json`. A manifest patcher may rewrite that file to drop the
//! disabled domains; when it does, it keeps the untouched copy next to it as
//! `manifest.json.orig`, and that copy is what flows must read.

use async_trait::async_trait;
use dcf_core::DEFAULT_CONFIG_DOMAIN;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Manifest file name inside an integration directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Pre-patch copy of the manifest left behind by the patcher
pub const ORIGINAL_MANIFEST_FILE: &str = "manifest.json.orig";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest {path} declares domain '{found}', expected '{expected}'")]
    DomainMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

/// Integration manifest from manifest.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationManifest {
    pub domain: String,
    pub name: String,
    #[serde(default)]
    pub integration_type: Option<String>,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub codeowners: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub after_dependencies: Vec<String>,
    #[serde(default)]
    pub quality_scale: Option<String>,
}

/// Dependency domains declared by a manifest
pub fn extract_manifest_dependencies(manifest: &IntegrationManifest) -> BTreeSet<String> {
    manifest.dependencies.iter().cloned().collect()
}

/// Provides the unpatched `default_config` manifest
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn original_manifest(&self) -> Result<IntegrationManifest, ManifestError>;
}

/// Reads `<components>/default_config/manifest.json`, preferring the
/// `.orig` backup when the patcher has left one.
#[derive(Debug, Clone)]
pub struct FileManifestSource {
    integration_dir: PathBuf,
}

impl FileManifestSource {
    /// Create a source rooted at the host's components directory
    pub fn new(components_dir: impl AsRef<Path>) -> Self {
        Self {
            integration_dir: components_dir.as_ref().join(DEFAULT_CONFIG_DOMAIN),
        }
    }

    async fn manifest_path(&self) -> PathBuf {
        let backup = self.integration_dir.join(ORIGINAL_MANIFEST_FILE);
        match tokio::fs::try_exists(&backup).await {
            Ok(true) => backup,
            _ => self.integration_dir.join(MANIFEST_FILE),
        }
    }
}

#[async_trait]
impl ManifestSource for FileManifestSource {
    async fn original_manifest(&self) -> Result<IntegrationManifest, ManifestError> {
        let path = self.manifest_path().await;
        debug!("Loading original manifest from {:?}", path);

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ManifestError::Read {
                path: path.clone(),
                source,
            })?;

        let manifest: IntegrationManifest =
            serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
                path: path.clone(),
                source,
            })?;

        if manifest.domain != DEFAULT_CONFIG_DOMAIN {
            return Err(ManifestError::DomainMismatch {
                path,
                expected: DEFAULT_CONFIG_DOMAIN.to_string(),
                found: manifest.domain,
            });
        }

        Ok(manifest)
    }
}

/// A manifest known up front, e.g. one compiled into the binary
#[derive(Debug, Clone)]
pub struct StaticManifestSource {
    manifest: IntegrationManifest,
}

impl StaticManifestSource {
    pub fn new(manifest: IntegrationManifest) -> Self {
        Self { manifest }
    }

    /// Parse a manifest from its JSON text
    pub fn from_json(content: &str) -> Result<Self, ManifestError> {
        let manifest = serde_json::from_str(content).map_err(|source| ManifestError::Parse {
            path: PathBuf::from(MANIFEST_FILE),
            source,
        })?;
        Ok(Self { manifest })
    }
}

#[async_trait]
impl ManifestSource for StaticManifestSource {
    async fn original_manifest(&self) -> Result<IntegrationManifest, ManifestError> {
        Ok(self.manifest.clone())
    }
}
