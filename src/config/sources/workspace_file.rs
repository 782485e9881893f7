//! Workspace config sources: preamble.toml, config/config.toml, config/{PREAMBLE_ENV}.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment selecting the env-specific workspace file.
pub const ENV_VAR: &str = "PREAMBLE_ENV";
const DEFAULT_ENV: &str = "development";

/// Workspace config files in increasing precedence.
pub fn workspace_config_paths(workspace_root: &Path) -> Vec<PathBuf> {
    let env_name = std::env::var(ENV_VAR)
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string());
    let config_dir = workspace_root.join("config");
    vec![
        workspace_root.join("preamble.toml"),
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", env_name)),
    ]
}

/// Add the workspace files that exist to builder.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = workspace_config_paths(workspace_root)
        .into_iter()
        .filter(|path| path.exists())
        .fold(builder, |builder, path| {
            debug!(config_path = %path.display(), "Adding workspace configuration");
            builder.add_source(File::from(path).required(false))
        });
    Ok(builder)
}
