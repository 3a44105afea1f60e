// Integration tests for the JSON API adapter
#[cfg(test)]
mod tests {
    use std::{
        fs,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use dynroute::{
        EditorResult, RoutingDocument, RoutingEditor, TimestampedBackupSink, YamlFileStore,
        adapters, config::RouteDefaults, ports::DocumentStore,
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(dir: &TempDir) -> Router {
        let path = dir.path().join("dynamic.yml");
        let editor = RoutingEditor::new(
            Arc::new(YamlFileStore::new(&path)),
            Arc::new(TimestampedBackupSink::new(&path, dir.path().join("backups"))),
            RouteDefaults::new("cloudflare", "example.com,home.lan"),
        );
        adapters::router(Arc::new(editor))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(&app(&dir), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_route_crud() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let (status, body) = send(&app, Method::GET, "/api/routes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/routes",
            Some(json!({
                "serviceName": "jellyfin",
                "subdomain": "media",
                "domain": "home.lan",
                "targetHost": "10.0.0.20",
                "targetPort": "8096",
                "middlewares": "auth"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Route 'jellyfin' saved");
        let route = &body["routes"][0];
        assert_eq!(route["id"], "jellyfin");
        assert_eq!(route["rule"], "Host(`media.home.lan`)");
        assert_eq!(route["serviceName"], "jellyfin-service");
        assert_eq!(route["target"], "http://10.0.0.20:8096");
        assert_eq!(route["middlewares"], json!(["auth"]));
        assert_eq!(route["entryPoints"], json!(["https"]));

        let (status, body) = send(&app, Method::DELETE, "/api/routes/jellyfin", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["routes"], json!([]));

        // deleting again is a quiet success
        let (status, _) = send(&app, Method::DELETE, "/api/routes/jellyfin", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_validation_error_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/routes",
            Some(json!({ "serviceName": "app", "targetPort": "80" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Target host is required");
        assert!(!dir.path().join("dynamic.yml").exists());
    }

    #[tokio::test]
    async fn test_middleware_crud_and_parse_error() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/middlewares",
            Some(json!({
                "name": "secure-headers",
                "content": "headers:\n  frameDeny: true\n"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["middlewares"][0]["name"], "secure-headers");
        assert_eq!(
            body["middlewares"][0]["content"],
            "headers:\n  frameDeny: true\n"
        );

        let saved = fs::read_to_string(dir.path().join("dynamic.yml")).unwrap();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/middlewares",
            Some(json!({ "name": "broken", "content": "headers: {frameDeny: " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Invalid YAML in middleware 'broken'")
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("dynamic.yml")).unwrap(),
            saved
        );

        let (status, body) = send(&app, Method::GET, "/api/middlewares", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) =
            send(&app, Method::DELETE, "/api/middlewares/secure-headers", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["middlewares"], json!([]));
    }

    #[tokio::test]
    async fn test_malformed_document_is_bad_request() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("dynamic.yml"), "http: {routers: [").unwrap();

        let (status, body) = send(&app(&dir), Method::GET, "/api/routes", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Invalid YAML in routing document")
        );
    }

    /// File store whose saves take a while and which records the highest
    /// number of saves in flight at once.
    struct SlowStore {
        inner: YamlFileStore,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl DocumentStore for SlowStore {
        fn load(&self) -> EditorResult<RoutingDocument> {
            self.inner.load()
        }

        fn save(&self, doc: &RoutingDocument) -> EditorResult<()> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(300));
            let result = self.inner.save(doc);
            self.active.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn route_body(name: &str) -> Value {
        json!({
            "serviceName": name,
            "subdomain": name,
            "targetHost": "10.0.0.1",
            "targetPort": "80"
        })
    }

    #[tokio::test]
    async fn test_dropped_request_keeps_write_lock_until_saved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dynamic.yml");
        let store = Arc::new(SlowStore {
            inner: YamlFileStore::new(&path),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let editor = RoutingEditor::new(
            store.clone(),
            Arc::new(TimestampedBackupSink::new(&path, dir.path().join("backups"))),
            RouteDefaults::new("cloudflare", "example.com"),
        );
        let app = adapters::router(Arc::new(editor));

        // the client gives up while the first save is still running
        let dropped = tokio::time::timeout(
            Duration::from_millis(50),
            send(&app, Method::POST, "/api/routes", Some(route_body("first"))),
        )
        .await;
        assert!(dropped.is_err());

        let (status, body) =
            send(&app, Method::POST, "/api/routes", Some(route_body("second"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.peak.load(Ordering::SeqCst), 1);

        let names: Vec<_> = body["routes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|route| route["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["first", "second"]);
    }
}
