//! Entry operations on the routing document.
//!
//! Every mutation follows the same cycle: validate the input, load the
//! latest document, change it in memory, snapshot the stored file, then save
//! the whole document. Nothing is cached between operations. If the backup
//! or the save fails the in-memory change is dropped.
use std::{path::PathBuf, sync::Arc};

use crate::{
    config::RouteDefaults,
    core::{
        document::RoutingDocument,
        error::{EditorError, EditorResult},
        forms::{MiddlewareForm, RouteForm},
        views::{MiddlewareView, RouteView, list_middlewares, list_routes},
    },
    ports::{BackupSink, DocumentStore},
};

/// Editor over one routing document. Cheap to share behind an `Arc`.
pub struct RoutingEditor {
    store: Arc<dyn DocumentStore>,
    backups: Arc<dyn BackupSink>,
    defaults: RouteDefaults,
}

impl RoutingEditor {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        backups: Arc<dyn BackupSink>,
        defaults: RouteDefaults,
    ) -> Self {
        Self {
            store,
            backups,
            defaults,
        }
    }

    pub fn defaults(&self) -> &RouteDefaults {
        &self.defaults
    }

    pub fn load(&self) -> EditorResult<RoutingDocument> {
        self.store.load()
    }

    pub fn routes_view(&self) -> EditorResult<Vec<RouteView>> {
        Ok(list_routes(&self.store.load()?))
    }

    pub fn middlewares_view(&self) -> EditorResult<Vec<MiddlewareView>> {
        list_middlewares(&self.store.load()?)
    }

    /// Create, update or rename a router together with its service.
    pub fn upsert_route(&self, form: &RouteForm) -> EditorResult<Vec<RouteView>> {
        let plan = form.plan(&self.defaults)?;
        let mut doc = self.store.load()?;

        if let Some(old) = &plan.replaces {
            if doc.remove_router_pair(old) {
                tracing::info!(from = %old, to = %plan.router_name, "Renaming route");
            }
        }
        doc.put_router(&plan.router_name, &plan.router)?;
        doc.put_service(&plan.service_name, &plan.service)?;

        self.commit(&doc)?;
        tracing::info!(
            router = %plan.router_name,
            rule = %plan.router.rule,
            target = %doc.resolve_target(&plan.router_name),
            "Saved route"
        );
        Ok(list_routes(&doc))
    }

    /// Remove a router and its linked service. A missing router is a quiet
    /// success and leaves the file untouched.
    pub fn delete_route(&self, id: &str) -> EditorResult<Vec<RouteView>> {
        let id = id.trim();
        if id.is_empty() {
            return Err(EditorError::validation("Route id is required"));
        }
        let mut doc = self.store.load()?;

        if doc.remove_router_pair(id) {
            self.commit(&doc)?;
            tracing::info!(router = %id, "Deleted route");
        } else {
            tracing::debug!(router = %id, "Route not found, nothing to delete");
        }
        Ok(list_routes(&doc))
    }

    /// Create, update or rename a middleware. Content that fails to parse
    /// aborts before anything is read or written.
    pub fn upsert_middleware(&self, form: &MiddlewareForm) -> EditorResult<Vec<MiddlewareView>> {
        let plan = form.plan()?;
        let mut doc = self.store.load()?;

        if let Some(old) = &plan.replaces {
            if doc.remove_middleware(old) {
                tracing::info!(from = %old, to = %plan.name, "Renaming middleware");
            }
        }
        doc.put_middleware(&plan.name, plan.value);

        self.commit(&doc)?;
        tracing::info!(middleware = %plan.name, "Saved middleware");
        list_middlewares(&doc)
    }

    /// Remove a middleware. Routers still referring to it are left alone.
    pub fn delete_middleware(&self, name: &str) -> EditorResult<Vec<MiddlewareView>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditorError::validation("Middleware name is required"));
        }
        let mut doc = self.store.load()?;

        if doc.remove_middleware(name) {
            self.commit(&doc)?;
            tracing::info!(middleware = %name, "Deleted middleware");
        } else {
            tracing::debug!(middleware = %name, "Middleware not found, nothing to delete");
        }
        list_middlewares(&doc)
    }

    fn commit(&self, doc: &RoutingDocument) -> EditorResult<Option<PathBuf>> {
        let snapshot = self.backups.backup()?;
        if let Some(path) = &snapshot {
            tracing::info!("Backed up routing document to {}", path.display());
        }
        self.store.save(doc)?;
        Ok(snapshot)
    }
}
