use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

/// Initialize structured logging with JSON output
pub fn init_tracing() -> Result<()> {
    Registry::default()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(true)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()
        .wrap_err("Failed to install JSON tracing subscriber")?;

    tracing::debug!("dynroute structured logging initialized");
    Ok(())
}

/// Initialize console-friendly logging
pub fn init_console_tracing() -> Result<()> {
    Registry::default()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false),
        )
        .try_init()
        .wrap_err("Failed to install console tracing subscriber")?;

    tracing::debug!("dynroute console logging initialized");
    Ok(())
}

/// Initialize tracing with an explicit filter directive such as `debug` or
/// `dynroute=trace,tower_http=info`
pub fn init_tracing_with_filter(filter: &str, json_format: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_new(filter).wrap_err_with(|| format!("Invalid log filter: {filter}"))?;

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    let installed = if json_format {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.json().with_span_list(true))
            .try_init()
    } else {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.compact())
            .try_init()
    };
    installed.wrap_err("Failed to install tracing subscriber")
}

/// `RUST_LOG` when set and valid, `info` otherwise
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
