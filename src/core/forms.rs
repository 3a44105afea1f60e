//! Turning submitted form fields into document entries.
//!
//! Everything here is pure: no file is read until a form has been resolved
//! into a plan, so invalid input never causes a backup or a write.
use serde::Deserialize;
use serde_yaml::Value;

use crate::{
    config::RouteDefaults,
    core::{
        document::{RouterEntry, RouterTls, ServiceEntry},
        error::{EditorError, EditorResult},
    },
};

/// Suffix joining a router name to the name of its backing service.
pub const SERVICE_SUFFIX: &str = "-service";

/// Entry point every router created by the editor is bound to.
pub const DEFAULT_ENTRY_POINT: &str = "https";

/// Fields of the route form. Keys are camelCase like the views; the
/// snake_case spellings are accepted too.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteForm {
    #[serde(alias = "service_name")]
    pub service_name: String,
    pub subdomain: String,
    /// Empty selects the first allow-listed domain
    pub domain: Option<String>,
    #[serde(alias = "target_host")]
    pub target_host: String,
    #[serde(alias = "target_port")]
    pub target_port: String,
    /// Comma separated middleware names
    pub middlewares: String,
    #[serde(alias = "is_edit")]
    pub is_edit: bool,
    #[serde(alias = "original_id")]
    pub original_id: Option<String>,
}

/// Fields of the middleware form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MiddlewareForm {
    pub name: String,
    /// YAML body of the middleware
    pub content: String,
    #[serde(alias = "is_edit")]
    pub is_edit: bool,
    #[serde(alias = "original_name")]
    pub original_name: Option<String>,
}

/// A validated route upsert, ready to apply to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    pub router_name: String,
    pub service_name: String,
    pub router: RouterEntry,
    pub service: ServiceEntry,
    /// Previous router name when the route is being renamed
    pub replaces: Option<String>,
}

/// A validated middleware upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct MiddlewarePlan {
    pub name: String,
    pub value: Value,
    pub replaces: Option<String>,
}

impl RouteForm {
    pub fn plan(&self, defaults: &RouteDefaults) -> EditorResult<RoutePlan> {
        let router_name = required(&self.service_name, "Service name")?;
        let host = required(&self.target_host, "Target host")?;
        let port = required(&self.target_port, "Target port")?;
        let domain = pick_domain(self.domain.as_deref(), defaults)?;

        let service_name = format!("{router_name}{SERVICE_SUFFIX}");
        let router = RouterEntry {
            rule: build_rule(self.subdomain.trim(), domain),
            entry_points: vec![DEFAULT_ENTRY_POINT.to_string()],
            tls: RouterTls {
                cert_resolver: defaults.cert_resolver.clone(),
            },
            service: service_name.clone(),
            middlewares: parse_middleware_list(&self.middlewares),
        };

        Ok(RoutePlan {
            replaces: renamed_from(self.is_edit, self.original_id.as_deref(), router_name),
            router_name: router_name.to_string(),
            service_name,
            router,
            service: ServiceEntry::single(build_target_url(host, port)),
        })
    }
}

impl MiddlewareForm {
    pub fn plan(&self) -> EditorResult<MiddlewarePlan> {
        let name = required(&self.name, "Middleware name")?;
        if self.content.trim().is_empty() {
            return Err(EditorError::validation("Middleware content is required"));
        }
        let value: Value = serde_yaml::from_str(&self.content)
            .map_err(|e| EditorError::parse(format!("middleware '{name}'"), e))?;

        Ok(MiddlewarePlan {
            replaces: renamed_from(self.is_edit, self.original_name.as_deref(), name),
            name: name.to_string(),
            value,
        })
    }
}

/// Host matching rule for a subdomain under `domain`.
///
/// A subdomain containing a dot is taken as a complete host name.
pub fn build_rule(subdomain: &str, domain: &str) -> String {
    let host = if subdomain.contains('.') {
        subdomain.to_string()
    } else if !subdomain.is_empty() {
        format!("{subdomain}.{domain}")
    } else {
        domain.to_string()
    };
    format!("Host(`{host}`)")
}

/// Upstream URL for a host and port. A host carrying its own scheme keeps
/// it; the port is appended verbatim, so the host must not end in `/`.
pub fn build_target_url(host: &str, port: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{host}:{port}")
    } else {
        format!("http://{host}:{port}")
    }
}

pub fn parse_middleware_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

fn required<'a>(value: &'a str, label: &str) -> EditorResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EditorError::validation(format!("{label} is required")));
    }
    Ok(value)
}

fn pick_domain<'a>(requested: Option<&str>, defaults: &'a RouteDefaults) -> EditorResult<&'a str> {
    match requested.map(str::trim).filter(|d| !d.is_empty()) {
        None => Ok(defaults.primary_domain()),
        Some(domain) => defaults
            .domains
            .iter()
            .find(|allowed| allowed.as_str() == domain)
            .map(String::as_str)
            .ok_or_else(|| EditorError::validation(format!("Domain '{domain}' is not allowed"))),
    }
}

fn renamed_from(is_edit: bool, original: Option<&str>, new_name: &str) -> Option<String> {
    if !is_edit {
        return None;
    }
    original
        .map(str::trim)
        .filter(|old| !old.is_empty() && *old != new_name)
        .map(str::to_owned)
}
