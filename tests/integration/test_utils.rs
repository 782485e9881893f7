//! Shared test utilities for integration tests
//!
//! Environment isolation for config loading and fixture definition files.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes access to HOME / XDG_CONFIG_HOME / PREAMBLE_* across tests.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ISOLATED_VARS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "PREAMBLE_ENV",
    "PREAMBLE_EXECUTION__MAX_EXPANSION_DEPTH",
    "PREAMBLE_EXECUTION__CONTEXT_NAME",
];

/// Definitions used across the integration suite.
pub const BASE_DEFINITIONS: &str = r#"
[versions]
"Getopt::Long" = "2.49"

[providers.base]
always = ["strict", "warnings"]

[providers.base.bundles]
withSig = ["feature", ["signatures"], ">-warnings", ["experimentalSignatures"]]
exports = ["exporter", ["foo", "bar", "baz"]]
getopt = [{ "Getopt::Long" = "2.43" }, ["GetOptions"]]
modern = [{ "Getopt::Long" = "3.0" }]

[providers.app]
parent = "base"
always = ["<utf8", "&request-args"]

[providers.app.bundles]
class = ["-indirect", ">namespace::autoclean"]
"#;

/// Run `f` with HOME and XDG_CONFIG_HOME pointing into `test_dir` and
/// PREAMBLE_* overrides cleared. The environment is restored afterwards.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ISOLATED_VARS
        .iter()
        .map(|key| (*key, std::env::var(key).ok()))
        .collect();

    let home = test_dir.path().join("home");
    let config_home = test_dir.path().join("config");
    std::fs::create_dir_all(&home).unwrap();
    std::fs::create_dir_all(&config_home).unwrap();
    for key in ISOLATED_VARS {
        std::env::remove_var(key);
    }
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", &config_home);

    let result = f();

    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
    result
}

/// Write `contents` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}
