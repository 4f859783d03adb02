//! Domain names and constants
//!
//! Integration domains that may be disabled are restricted to the grammar
//! `[A-Za-z0-9_]+`. Anything else would produce a key the manifest patcher
//! cannot match against a dependency.

use regex::Regex;
use std::sync::OnceLock;

/// Domain of this integration, also its singleton unique id
pub const DOMAIN: &str = "default_config_filter";

/// Domain of the bundle whose dependencies are filtered
pub const DEFAULT_CONFIG_DOMAIN: &str = "default_config";

/// The `config` integration hosts the UI used to edit the filter, so it is
/// never offered for disabling.
pub const CONFIG_DOMAIN: &str = "config";

/// Domain of the host's core services
pub const HA_DOMAIN: &str = "homeassistant";

/// Service that restarts the host
pub const SERVICE_HOMEASSISTANT_RESTART: &str = "restart";

static DOMAIN_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn domain_name_re() -> &'static Regex {
    DOMAIN_NAME_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("domain grammar is a valid regex"))
}

/// Check whether a string is an acceptable domain name.
///
/// Matches `^[A-Za-z0-9_]+$`; the empty string is rejected.
pub fn is_valid_domain_name(name: &str) -> bool {
    domain_name_re().is_match(name)
}
