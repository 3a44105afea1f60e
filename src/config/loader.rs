use std::{collections::HashMap, path::Path};

use config::{Config, Environment, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::EditorSettings;

/// Prefix of the environment variables overriding settings,
/// e.g. `DYNROUTE_CERT_RESOLVER`.
pub const ENV_PREFIX: &str = "DYNROUTE";

/// Load settings from defaults, an optional settings file and the process
/// environment, later sources winning.
pub fn load_settings(config_path: Option<&str>) -> Result<EditorSettings> {
    load_settings_with_env(config_path, None)
}

/// Same as [`load_settings`], reading variables from `env` instead of the
/// process environment when given.
pub fn load_settings_with_env(
    config_path: Option<&str>,
    env: Option<HashMap<String, String>>,
) -> Result<EditorSettings> {
    let defaults = EditorSettings::default();
    let mut builder = Config::builder()
        .set_default(
            "dynamic_config",
            defaults.dynamic_config.to_string_lossy().into_owned(),
        )?
        .set_default(
            "backup_dir",
            defaults.backup_dir.to_string_lossy().into_owned(),
        )?
        .set_default("cert_resolver", defaults.cert_resolver)?
        .set_default("domains", defaults.domains)?
        .set_default("listen_addr", defaults.listen_addr)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::new(path, file_format(Path::new(path))));
    }

    let settings = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).source(env))
        .build()
        .with_context(|| match config_path {
            Some(path) => format!("Failed to build settings from {path}"),
            None => "Failed to build settings".to_string(),
        })?;

    settings
        .try_deserialize()
        .wrap_err("Failed to deserialize settings")
}

/// Determine file format based on extension, defaulting to YAML
fn file_format(path: &Path) -> FileFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        _ => FileFormat::Yaml,
    }
}
