//! ConfigLoader: assembles the layered sources into a `PreambleConfig`.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::PreambleConfig;
use crate::error::ApiError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads configuration. Precedence (highest last): defaults, global file,
/// workspace files, environment.
#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    pub fn load(workspace_root: &Path) -> Result<PreambleConfig, ApiError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let mut config: PreambleConfig = builder.build()?.try_deserialize()?;
        config.definitions = resolve_paths(config.definitions, workspace_root);
        debug!(
            workspace = %workspace_root.display(),
            definitions = config.definitions.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load configuration from a single file over the defaults. Relative
    /// definition paths are taken relative to the file's directory.
    pub fn load_from_file(path: &Path) -> Result<PreambleConfig, ApiError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let mut config: PreambleConfig = builder.build()?.try_deserialize()?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.definitions = resolve_paths(config.definitions, base);
        Ok(config)
    }

    /// Path of the global configuration file, if one can be determined.
    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}

fn resolve_paths(paths: Vec<PathBuf>, base: &Path) -> Vec<PathBuf> {
    paths
        .into_iter()
        .map(|path| {
            if path.is_absolute() {
                path
            } else {
                base.join(path)
            }
        })
        .collect()
}
