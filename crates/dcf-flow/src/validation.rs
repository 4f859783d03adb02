//! Parsing of the free-text extra domains field

use dcf_core::is_valid_domain_name;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Tokens from the extra domains field that are not valid domain names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid domain names: {}", join_tokens(.failed))]
pub struct InvalidDomains {
    pub failed: Vec<String>,
}

impl InvalidDomains {
    /// Human-readable list of the failed tokens for the form description
    pub fn placeholder(&self) -> String {
        join_tokens(&self.failed)
    }
}

fn join_tokens(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|token| DisplayToken(token).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

struct DisplayToken<'a>(&'a str);

impl fmt::Display for DisplayToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("\"\"")
        } else {
            f.write_str(self.0)
        }
    }
}

/// Split comma-separated text into domain names.
///
/// Every token is trimmed and must match `[A-Za-z0-9_]+`. The text is
/// accepted or rejected as a whole; empty tokens (`"a,,b"`, a trailing
/// comma) count as invalid.
pub fn parse_extra_domains(text: &str) -> Result<BTreeSet<String>, InvalidDomains> {
    let mut domains = BTreeSet::new();
    let mut failed = Vec::new();

    for token in text.split(',').map(str::trim) {
        if is_valid_domain_name(token) {
            domains.insert(token.to_string());
        } else if !failed.iter().any(|f| f == token) {
            failed.push(token.to_string());
        }
    }

    if failed.is_empty() {
        Ok(domains)
    } else {
        Err(InvalidDomains { failed })
    }
}
