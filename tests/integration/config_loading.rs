//! Integration tests for layered configuration

use crate::integration::{with_isolated_env, write_file, BASE_DEFINITIONS};
use preamble::cli::{Commands, RequestArgs, RunContext};
use preamble::config::ConfigLoader;
use tempfile::TempDir;

#[test]
fn test_workspace_config_supplies_definitions() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    write_file(&workspace, "defs/base.toml", BASE_DEFINITIONS);
    write_file(
        &workspace,
        "config/config.toml",
        "definitions = [\"defs/base.toml\"]\n\n[execution]\ncontext_name = \"script\"\n",
    );

    with_isolated_env(&test_dir, || {
        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.definitions, vec![workspace.join("defs/base.toml")]);
        assert_eq!(config.execution.context_name, "script");

        let run = RunContext::new(workspace.clone(), None, Vec::new()).unwrap();
        assert_eq!(run.definitions().provider_names(), vec!["app", "base"]);

        let output = run
            .execute(&Commands::Apply(RequestArgs {
                provider: "base".to_string(),
                bundles: vec!["withSig".to_string()],
                exclude: Vec::new(),
                args: Vec::new(),
                format: "text".to_string(),
            }))
            .unwrap();
        assert!(output.starts_with("Context: script (batch 1)"));
    });
}

#[test]
fn test_environment_file_layer() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    write_file(&workspace, "config/config.toml", "[execution]\nmax_expansion_depth = 4\n");
    write_file(&workspace, "config/ci.toml", "[execution]\nmax_expansion_depth = 2\n");

    with_isolated_env(&test_dir, || {
        assert_eq!(
            ConfigLoader::load(&workspace).unwrap().execution.max_expansion_depth,
            4
        );

        std::env::set_var("PREAMBLE_ENV", "ci");
        assert_eq!(
            ConfigLoader::load(&workspace).unwrap().execution.max_expansion_depth,
            2
        );
    });
}

#[test]
fn test_global_config_is_lowest_file_layer() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    std::fs::create_dir_all(&workspace).unwrap();
    write_file(
        &test_dir.path().join("config"),
        "preamble/config.toml",
        "[logging]\nlevel = \"warn\"\n",
    );

    with_isolated_env(&test_dir, || {
        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.logging.level, "warn");
    });
}

#[test]
fn test_run_context_requires_definitions() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    std::fs::create_dir_all(&workspace).unwrap();

    with_isolated_env(&test_dir, || {
        let err = RunContext::new(workspace.clone(), None, Vec::new())
            .err()
            .unwrap();
        assert!(err.to_string().contains("No definition files"));
    });
}

#[test]
fn test_invalid_config_rejected() {
    let test_dir = TempDir::new().unwrap();
    let config_file = write_file(
        test_dir.path(),
        "preamble.toml",
        "definitions = [\"defs.toml\"]\n\n[execution]\nmax_expansion_depth = 0\n",
    );

    let err = RunContext::new(test_dir.path().to_path_buf(), Some(config_file), Vec::new())
        .err()
        .unwrap();
    assert!(err.to_string().contains("max_expansion_depth"));
}
