//! JSON HTTP adapter over the routing editor.
//!
//! File I/O is synchronous, so every operation runs on the blocking pool.
//! Mutations additionally hold one async mutex for the whole blocking task,
//! so two requests in this process cannot interleave their load/save cycles
//! even when a client disconnects mid-write.
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::core::{
    EditorError, EditorResult, MiddlewareForm, MiddlewareView, RouteForm, RouteView,
    RoutingEditor,
};

#[derive(Clone)]
pub struct ApiState {
    editor: Arc<RoutingEditor>,
    write_lock: Arc<Mutex<()>>,
}

impl ApiState {
    pub fn new(editor: Arc<RoutingEditor>) -> Self {
        Self {
            editor,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn read<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&RoutingEditor) -> EditorResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let editor = self.editor.clone();
        tokio::task::spawn_blocking(move || op(editor.as_ref()))
            .await
            .map_err(|e| ApiError::internal(format!("Editor task failed: {e}")))?
            .map_err(ApiError::from)
    }

    async fn write<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&RoutingEditor) -> EditorResult<T> + Send + 'static,
        T: Send + 'static,
    {
        // Owned by the blocking task so a dropped request keeps it until the
        // save returns.
        let guard = self.write_lock.clone().lock_owned().await;
        let editor = self.editor.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            op(editor.as_ref())
        })
        .await
        .map_err(|e| ApiError::internal(format!("Editor task failed: {e}")))?
        .map_err(ApiError::from)
    }
}

/// Build the API router
pub fn router(editor: Arc<RoutingEditor>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/routes", get(list_routes).post(upsert_route))
        .route("/api/routes/{id}", delete(delete_route))
        .route(
            "/api/middlewares",
            get(list_middlewares).post(upsert_middleware),
        )
        .route("/api/middlewares/{name}", delete(delete_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(ApiState::new(editor))
}

#[derive(Debug, Serialize)]
pub struct RoutesResponse {
    pub message: String,
    pub routes: Vec<RouteView>,
}

#[derive(Debug, Serialize)]
pub struct MiddlewaresResponse {
    pub message: String,
    pub middlewares: Vec<MiddlewareView>,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_routes(State(state): State<ApiState>) -> Result<Json<Vec<RouteView>>, ApiError> {
    state.read(|editor| editor.routes_view()).await.map(Json)
}

async fn upsert_route(
    State(state): State<ApiState>,
    Json(form): Json<RouteForm>,
) -> Result<Json<RoutesResponse>, ApiError> {
    let name = form.service_name.trim().to_string();
    let routes = state.write(move |editor| editor.upsert_route(&form)).await?;
    Ok(Json(RoutesResponse {
        message: format!("Route '{name}' saved"),
        routes,
    }))
}

async fn delete_route(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<RoutesResponse>, ApiError> {
    let message = format!("Route '{id}' deleted");
    let routes = state.write(move |editor| editor.delete_route(&id)).await?;
    Ok(Json(RoutesResponse { message, routes }))
}

async fn list_middlewares(
    State(state): State<ApiState>,
) -> Result<Json<Vec<MiddlewareView>>, ApiError> {
    state.read(|editor| editor.middlewares_view()).await.map(Json)
}

async fn upsert_middleware(
    State(state): State<ApiState>,
    Json(form): Json<MiddlewareForm>,
) -> Result<Json<MiddlewaresResponse>, ApiError> {
    let name = form.name.trim().to_string();
    let middlewares = state
        .write(move |editor| editor.upsert_middleware(&form))
        .await?;
    Ok(Json(MiddlewaresResponse {
        message: format!("Middleware '{name}' saved"),
        middlewares,
    }))
}

async fn delete_middleware(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<Json<MiddlewaresResponse>, ApiError> {
    let message = format!("Middleware '{name}' deleted");
    let middlewares = state
        .write(move |editor| editor.delete_middleware(&name))
        .await?;
    Ok(Json(MiddlewaresResponse {
        message,
        middlewares,
    }))
}

/// Failure answered as `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

impl From<EditorError> for ApiError {
    fn from(err: EditorError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!("Routing document operation failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
