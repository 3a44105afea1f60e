//! dynroute - an editor for a reverse proxy's dynamic routing file.
//!
//! The routing file is a YAML document holding `http.routers`,
//! `http.services` and `http.middlewares`. dynroute keeps a router and its
//! backing service paired (`<name>` ↔ `<name>-service`), supports create,
//! rename and delete of routes and middlewares, and copies the file to a
//! timestamped `.bak` snapshot before every write.
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use dynroute::{
//!     RouteForm, RoutingEditor, TimestampedBackupSink, YamlFileStore, config::RouteDefaults,
//! };
//!
//! # fn main() -> eyre::Result<()> {
//! let editor = RoutingEditor::new(
//!     Arc::new(YamlFileStore::new("dynamic.yml")),
//!     Arc::new(TimestampedBackupSink::new("dynamic.yml", "backups")),
//!     RouteDefaults::new("cloudflare", "example.com"),
//! );
//! let routes = editor.upsert_route(&RouteForm {
//!     service_name: "plex".into(),
//!     subdomain: "plex".into(),
//!     target_host: "192.168.1.10".into(),
//!     target_port: "32400".into(),
//!     ..Default::default()
//! })?;
//! assert_eq!(routes[0].target, "http://192.168.1.10:32400");
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations)
//! while keeping the document model and entry operations inside `core`.
//!
//! # Error Handling
//! Library operations return [`EditorResult`]; the `Display` of an
//! [`EditorError`] is the short message meant for the user. The binary uses
//! `eyre` with context attached via `WrapErr`.
pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

pub use crate::{
    adapters::{TimestampedBackupSink, YamlFileStore},
    core::{
        DocumentValidator, EditorError, EditorResult, MiddlewareForm, RouteForm, RoutingDocument,
        RoutingEditor,
    },
};
