//! In-memory model of the dynamic routing document.
//!
//! The document is kept as a generic YAML tree so that keys this crate does
//! not know about (TCP routers, extra service options, comments aside) survive
//! a load/save cycle untouched. `serde_yaml::Mapping` preserves insertion
//! order, so the file layout only changes where an entry is added or removed.
//!
//! Typed accessors over `http.routers`, `http.services` and
//! `http.middlewares` are layered on top. Mutable accessors create missing
//! parents; read-only ones never touch the tree.
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::core::error::{EditorError, EditorResult};

const HTTP_KEY: &str = "http";

/// Placeholder shown when a router's target cannot be resolved.
pub const UNRESOLVED_TARGET: &str = "N/A";

/// The three collections living under `http`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Routers,
    Services,
    Middlewares,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Routers,
        Collection::Services,
        Collection::Middlewares,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Collection::Routers => "routers",
            Collection::Services => "services",
            Collection::Middlewares => "middlewares",
        }
    }
}

/// Router entry as written by the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterEntry {
    pub rule: String,
    pub entry_points: Vec<String>,
    pub tls: RouterTls,
    pub service: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub middlewares: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterTls {
    pub cert_resolver: String,
}

/// Service entry as written by the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub load_balancer: LoadBalancer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub servers: Vec<ServerUrl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerUrl {
    pub url: String,
}

impl ServiceEntry {
    /// A load-balanced service with a single upstream.
    pub fn single(url: impl Into<String>) -> Self {
        Self {
            load_balancer: LoadBalancer {
                servers: vec![ServerUrl { url: url.into() }],
            },
        }
    }
}

/// Dynamic routing document backed by an ordered YAML tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingDocument {
    root: Value,
}

impl Default for RoutingDocument {
    /// `{http: {routers: {}, services: {}, middlewares: {}}}`
    fn default() -> Self {
        let mut doc = Self {
            root: Value::Mapping(Mapping::new()),
        };
        for collection in Collection::ALL {
            doc.collection_mut(collection);
        }
        doc
    }
}

impl RoutingDocument {
    /// Wrap an already parsed tree. Anything other than a mapping yields the
    /// default document.
    pub fn from_value(root: Value) -> Self {
        if root.is_mapping() {
            Self { root }
        } else {
            Self::default()
        }
    }

    /// Parse YAML text. Blank text, or text holding a scalar or sequence,
    /// yields the default document. A syntax error is reported, and so is an
    /// `http` section or collection that is present but not a mapping.
    pub fn from_yaml_str(text: &str) -> EditorResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let root: Value =
            serde_yaml::from_str(text).map_err(|e| EditorError::parse("routing document", e))?;
        check_shape(&root)?;
        Ok(Self::from_value(root))
    }

    pub fn to_yaml_string(&self) -> EditorResult<String> {
        serde_yaml::to_string(&self.root).map_err(|e| EditorError::parse("routing document", e))
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn collection(&self, collection: Collection) -> Option<&Mapping> {
        self.root
            .get(HTTP_KEY)
            .and_then(|http| http.get(collection.key()))
            .and_then(Value::as_mapping)
    }

    /// Mutable access to a collection, creating `http` and the collection if
    /// they are absent or null.
    pub fn collection_mut(&mut self, collection: Collection) -> &mut Mapping {
        let root = ensure_mapping(&mut self.root);
        let http = ensure_mapping(root.entry(Value::from(HTTP_KEY)).or_insert(Value::Null));
        ensure_mapping(
            http.entry(Value::from(collection.key()))
                .or_insert(Value::Null),
        )
    }

    pub fn routers(&self) -> Option<&Mapping> {
        self.collection(Collection::Routers)
    }

    pub fn services(&self) -> Option<&Mapping> {
        self.collection(Collection::Services)
    }

    pub fn middlewares(&self) -> Option<&Mapping> {
        self.collection(Collection::Middlewares)
    }

    pub fn routers_mut(&mut self) -> &mut Mapping {
        self.collection_mut(Collection::Routers)
    }

    pub fn services_mut(&mut self) -> &mut Mapping {
        self.collection_mut(Collection::Services)
    }

    pub fn middlewares_mut(&mut self) -> &mut Mapping {
        self.collection_mut(Collection::Middlewares)
    }

    pub fn router(&self, name: &str) -> Option<&Value> {
        self.routers().and_then(|routers| routers.get(name))
    }

    pub fn service(&self, name: &str) -> Option<&Value> {
        self.services().and_then(|services| services.get(name))
    }

    pub fn middleware(&self, name: &str) -> Option<&Value> {
        self.middlewares().and_then(|middlewares| middlewares.get(name))
    }

    /// Name of the service a router forwards to, if it names one.
    pub fn linked_service(&self, router: &str) -> Option<&str> {
        self.router(router)
            .and_then(|entry| entry.get("service"))
            .and_then(Value::as_str)
    }

    /// Insert or overwrite a router. An existing key keeps its position.
    pub fn put_router(&mut self, name: &str, entry: &RouterEntry) -> EditorResult<()> {
        let value = to_tree(entry, name)?;
        self.routers_mut().insert(Value::from(name), value);
        Ok(())
    }

    /// Insert or overwrite a service. An existing key keeps its position.
    pub fn put_service(&mut self, name: &str, entry: &ServiceEntry) -> EditorResult<()> {
        let value = to_tree(entry, name)?;
        self.services_mut().insert(Value::from(name), value);
        Ok(())
    }

    pub fn put_middleware(&mut self, name: &str, value: Value) {
        self.middlewares_mut().insert(Value::from(name), value);
    }

    /// Remove a router together with the service it links to. Returns
    /// `false` when the router did not exist.
    pub fn remove_router_pair(&mut self, name: &str) -> bool {
        let linked = self.linked_service(name).map(str::to_owned);
        if self.routers_mut().shift_remove(name).is_none() {
            return false;
        }
        if let Some(service) = linked {
            self.services_mut().shift_remove(service.as_str());
        }
        true
    }

    pub fn remove_middleware(&mut self, name: &str) -> bool {
        self.middlewares_mut().shift_remove(name).is_some()
    }

    /// Router -> service -> first server URL, or [`UNRESOLVED_TARGET`].
    pub fn resolve_target(&self, router: &str) -> String {
        self.linked_service(router)
            .and_then(|service| self.service(service))
            .and_then(first_server_url)
            .unwrap_or(UNRESOLVED_TARGET)
            .to_string()
    }
}

/// First `loadBalancer.servers[].url` of a service value.
pub(crate) fn first_server_url(service: &Value) -> Option<&str> {
    service
        .get("loadBalancer")
        .and_then(|lb| lb.get("servers"))
        .and_then(Value::as_sequence)
        .and_then(|servers| servers.first())
        .and_then(|server| server.get("url"))
        .and_then(Value::as_str)
}

/// Sequence of strings under `key`, skipping non-string items.
pub(crate) fn string_list(entry: &Value, key: &str) -> Vec<String> {
    entry
        .get(key)
        .and_then(Value::as_sequence)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn to_tree<T: Serialize>(entry: &T, name: &str) -> EditorResult<Value> {
    serde_yaml::to_value(entry).map_err(|e| EditorError::parse(format!("entry '{name}'"), e))
}

/// `http` and each collection under it must be a mapping or null.
fn check_shape(root: &Value) -> EditorResult<()> {
    let Some(http) = root.get(HTTP_KEY).filter(|http| !http.is_null()) else {
        return Ok(());
    };
    if !http.is_mapping() {
        return Err(shape_error(HTTP_KEY.to_string(), http));
    }
    for collection in Collection::ALL {
        match http.get(collection.key()) {
            Some(value) if !value.is_null() && !value.is_mapping() => {
                return Err(shape_error(
                    format!("{HTTP_KEY}.{}", collection.key()),
                    value,
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn shape_error(key: String, found: &Value) -> EditorError {
    let kind = match found {
        Value::Sequence(_) => "a sequence",
        Value::Tagged(_) => "a tagged value",
        _ => "a scalar",
    };
    EditorError::parse(
        "routing document",
        <serde_yaml::Error as serde::de::Error>::custom(format!(
            "`{key}` must be a mapping, found {kind}"
        )),
    )
}

fn ensure_mapping(value: &mut Value) -> &mut Mapping {
    if !value.is_mapping() {
        *value = Value::Mapping(Mapping::new());
    }
    match value {
        Value::Mapping(mapping) => mapping,
        _ => unreachable!("value was just replaced with a mapping"),
    }
}
