//! Settings for the editor process.
//!
//! [`EditorSettings`] maps one-to-one onto the settings file and the
//! `DYNROUTE_*` environment variables. [`RouteDefaults`] is the slice of it
//! the entry operations need, built once at startup.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Resolver used when nothing else is configured
pub const DEFAULT_CERT_RESOLVER: &str = "cloudflare";

/// Domain used when the allow-list is empty
pub const FALLBACK_DOMAIN: &str = "example.com";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EditorSettings {
    /// Path of the dynamic routing YAML file
    pub dynamic_config: PathBuf,
    /// Directory receiving `<file>.<timestamp>.bak` snapshots
    pub backup_dir: PathBuf,
    /// Certificate resolver written into every router's `tls` block
    pub cert_resolver: String,
    /// Comma separated list of domains routes may be created under
    pub domains: String,
    /// Address the HTTP API binds to
    pub listen_addr: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            dynamic_config: PathBuf::from("dynamic.yml"),
            backup_dir: PathBuf::from("backups"),
            cert_resolver: DEFAULT_CERT_RESOLVER.to_string(),
            domains: FALLBACK_DOMAIN.to_string(),
            listen_addr: "0.0.0.0:5000".to_string(),
        }
    }
}

impl EditorSettings {
    pub fn route_defaults(&self) -> RouteDefaults {
        RouteDefaults::new(&self.cert_resolver, &self.domains)
    }
}

/// Values applied to every route the editor writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefaults {
    pub cert_resolver: String,
    /// Never empty; the first entry is the default choice
    pub domains: Vec<String>,
}

impl RouteDefaults {
    pub fn new(cert_resolver: &str, domains: &str) -> Self {
        let mut domains: Vec<String> = domains
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_owned)
            .collect();
        if domains.is_empty() {
            domains.push(FALLBACK_DOMAIN.to_string());
        }

        let cert_resolver = match cert_resolver.trim() {
            "" => DEFAULT_CERT_RESOLVER,
            resolver => resolver,
        };

        Self {
            cert_resolver: cert_resolver.to_string(),
            domains,
        }
    }

    pub fn primary_domain(&self) -> &str {
        self.domains
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_DOMAIN)
    }
}

impl Default for RouteDefaults {
    fn default() -> Self {
        EditorSettings::default().route_defaults()
    }
}
