// Integration tests for the routing document lifecycle
#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf, sync::Arc};

    use dynroute::{
        MiddlewareForm, RouteForm, RoutingDocument, RoutingEditor, TimestampedBackupSink,
        YamlFileStore, config::RouteDefaults, ports::DocumentStore,
    };
    use tempfile::TempDir;

    struct Workspace {
        dir: TempDir,
        editor: RoutingEditor,
        store: YamlFileStore,
    }

    fn workspace() -> Workspace {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dynamic.yml");
        let store = YamlFileStore::new(&path);
        let editor = RoutingEditor::new(
            Arc::new(store.clone()),
            Arc::new(TimestampedBackupSink::new(&path, dir.path().join("backups"))),
            RouteDefaults::new("cloudflare", "example.com"),
        );
        Workspace { dir, editor, store }
    }

    fn backups(ws: &Workspace) -> Vec<PathBuf> {
        fs::read_dir(ws.dir.path().join("backups"))
            .map(|entries| entries.map(|e| e.unwrap().path()).collect())
            .unwrap_or_default()
    }

    fn form(service: &str, subdomain: &str, host: &str, port: &str) -> RouteForm {
        RouteForm {
            service_name: service.to_string(),
            subdomain: subdomain.to_string(),
            domain: Some("example.com".to_string()),
            target_host: host.to_string(),
            target_port: port.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_plex_scenario_on_empty_document() {
        let ws = workspace();

        ws.editor
            .upsert_route(&form("plex", "plex", "192.168.1.10", "32400"))
            .unwrap();

        let text = fs::read_to_string(ws.store.path()).unwrap();
        let yaml: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
        let router = &yaml["http"]["routers"]["plex"];
        assert_eq!(router["rule"], "Host(`plex.example.com`)");
        assert_eq!(router["service"], "plex-service");
        assert_eq!(router["entryPoints"][0], "https");
        assert_eq!(router["tls"]["certResolver"], "cloudflare");
        assert_eq!(
            yaml["http"]["services"]["plex-service"]["loadBalancer"]["servers"][0]["url"],
            "http://192.168.1.10:32400"
        );
        assert!(yaml["http"]["middlewares"].as_mapping().unwrap().is_empty());
    }

    #[test]
    fn test_every_upsert_keeps_router_service_pairing() {
        let ws = workspace();
        for (name, sub) in [("sonarr", "tv"), ("radarr", "movies"), ("sonarr", "series")] {
            ws.editor
                .upsert_route(&form(name, sub, "10.0.0.2", "8989"))
                .unwrap();

            let doc = ws.store.load().unwrap();
            let service = format!("{name}-service");
            assert_eq!(doc.linked_service(name), Some(service.as_str()));
            assert!(doc.service(&service).is_some());
        }

        let routes = ws.editor.routes_view().unwrap();
        let names: Vec<_> = routes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["sonarr", "radarr"]);
        assert_eq!(routes[0].rule, "Host(`series.example.com`)");
    }

    fn middleware(name: &str) -> MiddlewareForm {
        MiddlewareForm {
            name: name.to_string(),
            content: "headers:\n  frameDeny: true\n".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_each_mutation_leaves_exactly_one_new_backup() {
        let ws = workspace();
        ws.editor
            .upsert_route(&form("a", "a", "10.0.0.1", "80"))
            .unwrap();
        ws.editor.upsert_middleware(&middleware("auth")).unwrap();
        let mut seen = backups(&ws);
        assert_eq!(seen.len(), 1);

        let mutations: Vec<(&str, Box<dyn Fn(&RoutingEditor)>)> = vec![
            (
                "upsert route",
                Box::new(|editor: &RoutingEditor| {
                    editor
                        .upsert_route(&form("b", "b", "10.0.0.2", "80"))
                        .unwrap();
                }),
            ),
            (
                "upsert middleware",
                Box::new(|editor: &RoutingEditor| {
                    editor.upsert_middleware(&middleware("headers")).unwrap();
                }),
            ),
            (
                "delete route",
                Box::new(|editor: &RoutingEditor| {
                    editor.delete_route("a").unwrap();
                }),
            ),
            (
                "delete middleware",
                Box::new(|editor: &RoutingEditor| {
                    editor.delete_middleware("auth").unwrap();
                }),
            ),
        ];

        for (label, mutate) in mutations {
            let before = fs::read_to_string(ws.store.path()).unwrap();
            mutate(&ws.editor);

            let after = backups(&ws);
            let fresh: Vec<_> = after.iter().filter(|p| !seen.contains(*p)).collect();
            assert_eq!(fresh.len(), 1, "{label} should leave one new backup");
            assert_eq!(
                fs::read_to_string(fresh[0]).unwrap(),
                before,
                "{label} backup should hold the pre-mutation file"
            );
            assert_ne!(fs::read_to_string(ws.store.path()).unwrap(), before);
            seen = after;
        }
    }

    #[test]
    fn test_rename_then_delete() {
        let ws = workspace();
        ws.editor
            .upsert_route(&form("a", "a", "10.0.0.1", "80"))
            .unwrap();

        let mut rename = form("b", "b", "10.0.0.1", "80");
        rename.is_edit = true;
        rename.original_id = Some("a".to_string());
        ws.editor.upsert_route(&rename).unwrap();

        let doc = ws.store.load().unwrap();
        assert!(doc.router("a").is_none() && doc.service("a-service").is_none());
        assert!(doc.router("b").is_some() && doc.service("b-service").is_some());

        ws.editor.delete_route("b").unwrap();
        let once = ws.store.load().unwrap();
        ws.editor.delete_route("b").unwrap();
        assert_eq!(ws.store.load().unwrap(), once);
        assert_eq!(once, RoutingDocument::default());
    }

    #[test]
    fn test_hand_written_fields_survive_edits() {
        let ws = workspace();
        fs::write(
            ws.store.path(),
            r#"http:
  routers:
    dashboard:
      rule: Host(`traefik.example.com`)
      service: api@internal
      entryPoints:
        - https
  services: {}
  middlewares:
    redirect:
      redirectScheme:
        scheme: https
        permanent: true
  serversTransports:
    insecure:
      insecureSkipVerify: true
"#,
        )
        .unwrap();

        ws.editor
            .upsert_route(&form("app", "app", "10.0.0.1", "80"))
            .unwrap();

        let doc = ws.store.load().unwrap();
        assert_eq!(doc.linked_service("dashboard"), Some("api@internal"));
        assert!(doc.middleware("redirect").is_some());
        let transports = &doc.as_value()["http"]["serversTransports"]["insecure"];
        assert_eq!(transports["insecureSkipVerify"], true);

        let routes = ws.editor.routes_view().unwrap();
        assert_eq!(routes[0].name, "dashboard");
        assert_eq!(routes[0].target, "N/A");
        assert_eq!(routes[1].name, "app");
    }
}
