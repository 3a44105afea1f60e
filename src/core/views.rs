//! Display projections of the routing document.
use serde::Serialize;
use serde_yaml::Value;

use crate::core::{
    document::{RoutingDocument, string_list},
    error::{EditorError, EditorResult},
};

/// One router as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteView {
    pub id: String,
    pub name: String,
    pub rule: String,
    pub service_name: String,
    /// First upstream URL of the linked service, or `N/A`
    pub target: String,
    pub middlewares: Vec<String>,
    pub entry_points: Vec<String>,
}

/// One middleware with its body rendered back to YAML
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiddlewareView {
    pub name: String,
    pub content: String,
}

/// Routes in document order. Entries with non-string keys are skipped.
pub fn list_routes(doc: &RoutingDocument) -> Vec<RouteView> {
    let Some(routers) = doc.routers() else {
        return Vec::new();
    };
    routers
        .iter()
        .filter_map(|(key, entry)| {
            let name = key.as_str()?;
            Some(RouteView {
                id: name.to_string(),
                name: name.to_string(),
                rule: text_field(entry, "rule"),
                service_name: text_field(entry, "service"),
                target: doc.resolve_target(name),
                middlewares: string_list(entry, "middlewares"),
                entry_points: string_list(entry, "entryPoints"),
            })
        })
        .collect()
}

pub fn list_middlewares(doc: &RoutingDocument) -> EditorResult<Vec<MiddlewareView>> {
    let Some(middlewares) = doc.middlewares() else {
        return Ok(Vec::new());
    };
    middlewares
        .iter()
        .filter_map(|(key, value)| key.as_str().map(|name| (name, value)))
        .map(|(name, value)| {
            let content = serde_yaml::to_string(value)
                .map_err(|e| EditorError::parse(format!("middleware '{name}'"), e))?;
            Ok(MiddlewareView {
                name: name.to_string(),
                content,
            })
        })
        .collect()
}

fn text_field(entry: &Value, key: &str) -> String {
    entry
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
