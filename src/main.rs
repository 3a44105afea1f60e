use std::{net::SocketAddr, sync::Arc};

use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use dynroute::{
    DocumentValidator, RoutingDocument, RoutingEditor, TimestampedBackupSink, YamlFileStore,
    adapters, config::EditorSettings, ports::DocumentStore, tracing_setup, utils,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    /// Settings file (YAML, JSON or TOML); `DYNROUTE_*` variables override it
    #[clap(short, long, global = true)]
    config: Option<String>,

    /// Emit JSON logs instead of console output
    #[clap(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the JSON API (default)
    Serve,
    /// Print the configured routes
    Routes,
    /// Print the configured middlewares
    Middlewares,
    /// Check the routing document for dangling references
    Validate,
    /// Create an empty routing document
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    if args.json_logs {
        tracing_setup::init_tracing()?;
    } else {
        tracing_setup::init_console_tracing()?;
    }

    let settings = dynroute::config::load_settings(args.config.as_deref())
        .wrap_err("Failed to load settings")?;
    tracing::debug!("Loaded settings: {:?}", settings);

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(settings).await,
        Commands::Routes => print_routes(&settings),
        Commands::Middlewares => print_middlewares(&settings),
        Commands::Validate => validate_command(&settings),
        Commands::Init => init_command(&settings),
    }
}

fn build_editor(settings: &EditorSettings) -> RoutingEditor {
    RoutingEditor::new(
        Arc::new(YamlFileStore::new(&settings.dynamic_config)),
        Arc::new(TimestampedBackupSink::new(
            &settings.dynamic_config,
            &settings.backup_dir,
        )),
        settings.route_defaults(),
    )
}

async fn serve(settings: EditorSettings) -> Result<()> {
    let addr: SocketAddr = settings
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", settings.listen_addr))?;

    let editor = Arc::new(build_editor(&settings));
    tracing::info!(
        document = %settings.dynamic_config.display(),
        backups = %settings.backup_dir.display(),
        cert_resolver = %editor.defaults().cert_resolver,
        domains = ?editor.defaults().domains,
        "Routing editor ready"
    );

    let app = adapters::router(editor);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!("dynroute API listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(utils::shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown completed");
    Ok(())
}

fn print_routes(settings: &EditorSettings) -> Result<()> {
    let routes = build_editor(settings).routes_view()?;
    if routes.is_empty() {
        println!("No routes in {}", settings.dynamic_config.display());
        return Ok(());
    }
    for route in routes {
        println!("{}", route.name);
        println!("   • Rule: {}", route.rule);
        println!("   • Service: {} -> {}", route.service_name, route.target);
        println!("   • Entry points: {}", route.entry_points.join(", "));
        if !route.middlewares.is_empty() {
            println!("   • Middlewares: {}", route.middlewares.join(", "));
        }
    }
    Ok(())
}

fn print_middlewares(settings: &EditorSettings) -> Result<()> {
    let middlewares = build_editor(settings).middlewares_view()?;
    if middlewares.is_empty() {
        println!("No middlewares in {}", settings.dynamic_config.display());
        return Ok(());
    }
    for middleware in middlewares {
        println!("{}:", middleware.name);
        for line in middleware.content.lines() {
            println!("  {line}");
        }
    }
    Ok(())
}

/// Validate the routing document and exit non-zero on issues
fn validate_command(settings: &EditorSettings) -> Result<()> {
    let path = &settings.dynamic_config;
    println!("🔍 Validating routing document: {}", path.display());

    if !path.exists() {
        eprintln!("❌ Error: Routing document '{}' not found", path.display());
        std::process::exit(1);
    }

    let doc = match YamlFileStore::new(path).load() {
        Ok(doc) => {
            println!("✅ Document parsing: OK");
            doc
        }
        Err(e) => {
            eprintln!("❌ Document parsing failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    match DocumentValidator::validate(&doc) {
        Ok(()) => {
            println!("✅ References: OK");
            println!();
            println!("📋 Summary:");
            println!("   • Routers: {}", doc.routers().map_or(0, |m| m.len()));
            println!("   • Services: {}", doc.services().map_or(0, |m| m.len()));
            println!("   • Middlewares: {}", doc.middlewares().map_or(0, |m| m.len()));
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Reference check failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    }
}

/// Write the default empty document
fn init_command(settings: &EditorSettings) -> Result<()> {
    let path = &settings.dynamic_config;
    if path.exists() {
        return Err(eyre!(
            "Routing document '{}' already exists",
            path.display()
        ));
    }
    YamlFileStore::new(path)
        .save(&RoutingDocument::default())
        .wrap_err("Failed to write routing document")?;
    println!("✅ Created empty routing document at: {}", path.display());
    println!("   Run 'dynroute serve' to start editing it");
    Ok(())
}
