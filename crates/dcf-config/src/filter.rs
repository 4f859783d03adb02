//! The `default_config_filter:` section of `configuration.yaml`

use crate::error::{ConfigError, ConfigResult};
use dcf_core::{is_valid_domain_name, DOMAIN};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Name of the main configuration file inside the config directory
pub const CONFIGURATION_FILE: &str = "configuration.yaml";

/// Domains declared in YAML, with `true` meaning disabled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    domains: BTreeMap<String, bool>,
}

impl FilterConfig {
    /// Load the section from `<config_dir>/configuration.yaml`.
    ///
    /// Returns `Ok(None)` when the file has no `default_config_filter` key.
    pub fn load(config_dir: impl AsRef<Path>) -> ConfigResult<Option<Self>> {
        let path = config_dir.as_ref().join(CONFIGURATION_FILE);
        debug!("Loading YAML file: {:?}", path);

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        Self::from_yaml_str(&content, &path)
    }

    /// Parse the section out of a full configuration document
    pub fn from_yaml_str(content: &str, source_path: &Path) -> ConfigResult<Option<Self>> {
        let document: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: source_path.to_path_buf(),
            source: e,
        })?;

        match document.get(DOMAIN) {
            Some(section) => Self::from_section(section).map(Some),
            None => Ok(None),
        }
    }

    /// Build from the value under the `default_config_filter` key
    pub fn from_section(section: &Value) -> ConfigResult<Self> {
        let mut domains = BTreeMap::new();

        match section {
            Value::Null => {}
            Value::Mapping(map) => {
                for (key, value) in map {
                    let domain = yaml_string(key)?;
                    let disabled = value.as_bool().ok_or_else(|| ConfigError::InvalidValue {
                        key: format!("{}.{}", DOMAIN, domain),
                        reason: "expected a boolean".to_string(),
                    })?;
                    domains.insert(domain, disabled);
                }
            }
            Value::Sequence(items) => {
                for item in items {
                    domains.insert(yaml_string(item)?, true);
                }
            }
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: DOMAIN.to_string(),
                    reason: "expected a mapping of domain to boolean or a list of domains"
                        .to_string(),
                })
            }
        }

        for domain in domains.keys().filter(|d| !is_valid_domain_name(d)) {
            warn!(domain = %domain, "Imported domain does not look like an integration domain");
        }

        Ok(Self { domains })
    }

    /// Domains marked as disabled, in sorted order
    pub fn disabled_domains(&self) -> impl Iterator<Item = &str> {
        self.domains
            .iter()
            .filter(|(_, disabled)| **disabled)
            .map(|(domain, _)| domain.as_str())
    }

    /// Raw mapping for the config flow's import step
    pub fn import_input(&self) -> serde_json::Map<String, serde_json::Value> {
        self.domains
            .iter()
            .map(|(domain, disabled)| (domain.clone(), serde_json::Value::Bool(*disabled)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

fn yaml_string(value: &Value) -> ConfigResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(ConfigError::InvalidValue {
            key: DOMAIN.to_string(),
            reason: format!("expected a domain name, got {:?}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn parse(content: &str) -> ConfigResult<Option<FilterConfig>> {
        FilterConfig::from_yaml_str(content, &PathBuf::from("configuration.yaml"))
    }

    #[test]
    fn test_mapping_section() {
        let config = parse(
            r#"
homeassistant:
  name: Home
default_config:
default_config_filter:
  zeroconf: true
  ssdp: false
"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(config.disabled_domains().collect::<Vec<_>>(), vec!["zeroconf"]);

        let input = config.import_input();
        assert_eq!(input.get("zeroconf"), Some(&serde_json::json!(true)));
        assert_eq!(input.get("ssdp"), Some(&serde_json::json!(false)));
    }

    #[test]
    fn test_list_shorthand() {
        let config = parse("default_config_filter: [zeroconf, ssdp]\n")
            .unwrap()
            .unwrap();

        assert_eq!(
            config.disabled_domains().collect::<Vec<_>>(),
            vec!["ssdp", "zeroconf"]
        );
    }

    #[test]
    fn test_empty_section() {
        let config = parse("default_config_filter:\n").unwrap().unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_missing_section() {
        assert!(parse("default_config:\n").unwrap().is_none());
        assert!(parse("").unwrap().is_none());
    }

    #[test]
    fn test_other_tags_are_tolerated() {
        let config = parse(
            r#"
http: !include http.yaml
default_config_filter:
  cloud: true
"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(config.disabled_domains().collect::<Vec<_>>(), vec!["cloud"]);
    }

    #[test]
    fn test_non_boolean_value_rejected() {
        let err = parse("default_config_filter:\n  zeroconf: maybe\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "default_config_filter.zeroconf"));
    }

    #[test]
    fn test_scalar_section_rejected() {
        let err = parse("default_config_filter: zeroconf\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = parse("default_config_filter: [unclosed\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseYaml { .. }));
    }

    #[test]
    fn test_load_from_config_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIGURATION_FILE),
            "default_config_filter:\n  zeroconf: true\n",
        )
        .unwrap();

        let config = FilterConfig::load(dir.path()).unwrap().unwrap();
        assert_eq!(config.disabled_domains().collect::<Vec<_>>(), vec!["zeroconf"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = FilterConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
