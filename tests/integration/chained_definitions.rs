//! Provider chains declared in definition files and built in code

use crate::integration::{write_file, BASE_DEFINITIONS};
use preamble::capability::RecordingCapability;
use preamble::definition::{DefinitionSet, GeneratorRegistry};
use preamble::provider::DynamicCall;
use preamble::request::Request;
use preamble::resolver::resolve;
use preamble::types::ArgValue;
use preamble::{Context, Directive, DirectiveProvider, DynamicProvider, Executor, ResolveError};
use std::sync::Arc;
use tempfile::TempDir;

fn rendered(provider: &dyn DirectiveProvider, request: &Request) -> Vec<String> {
    resolve(provider, request)
        .unwrap()
        .directives()
        .iter()
        .map(|d| d.to_string())
        .collect()
}

#[test]
fn test_extended_provider_resolution_order() {
    let set = DefinitionSet::from_toml_str(BASE_DEFINITIONS, &preamble::cli::builtin_generators())
        .unwrap();
    let app = set.provider("app").unwrap();
    assert_eq!(
        app.bundle_names(),
        vec!["exports", "getopt", "modern", "withSig", "class"]
    );

    let request = Request::new(["withSig", "class"])
        .with_arg("--flavor", ArgValue::Word("vanilla".to_string()));
    assert_eq!(
        rendered(app.as_ref(), &request),
        vec![
            "<utf8",
            "strict",
            "warnings",
            "feature:[signatures]",
            "&request-args",
            "-indirect",
            ">-warnings:[experimentalSignatures]",
            ">namespace::autoclean"
        ]
    );

    let resolution = resolve(app.as_ref(), &request).unwrap();
    let mut context = Context::new("main");
    let report = Executor::default()
        .execute(&resolution, &RecordingCapability::new(), &mut context)
        .unwrap();
    assert_eq!(report.expanded, 1);
    let targets: Vec<&str> = context.journal().iter().map(|e| e.target.as_str()).collect();
    assert_eq!(
        targets,
        vec![
            "utf8",
            "strict",
            "warnings",
            "feature",
            "flavor",
            "indirect",
            "warnings",
            "namespace::autoclean"
        ]
    );
    assert_eq!(context.journal()[4].args, vec!["vanilla"]);
}

const OVERRIDE_DEFINITIONS: &str = r#"
[providers.base]
always = ["strict"]

[providers.base.bundles]
withSig = ["feature", ["signatures"]]

[providers.extending]
parent = "base"

[providers.extending.bundles]
withSig = ["-feature"]

[providers.overriding]
parent = "base"
mode = "override"

[providers.overriding.bundles]
withSig = ["-feature"]
"#;

#[test]
fn test_override_mode_replaces_parent_bundle() {
    let set = DefinitionSet::from_toml_str(OVERRIDE_DEFINITIONS, &GeneratorRegistry::new()).unwrap();
    let request = Request::new(["withSig"]);

    let extending = set.provider("extending").unwrap();
    assert_eq!(
        rendered(extending.as_ref(), &request),
        vec!["strict", "feature:[signatures]", "-feature"]
    );

    let overriding = set.provider("overriding").unwrap();
    assert_eq!(rendered(overriding.as_ref(), &request), vec!["strict", "-feature"]);
}

#[test]
fn test_unknown_bundle_reports_child_provider() {
    let set = DefinitionSet::from_toml_str(OVERRIDE_DEFINITIONS, &GeneratorRegistry::new()).unwrap();
    let provider = set.provider("overriding").unwrap();
    let err = resolve(provider.as_ref(), &Request::new(["missing"])).unwrap_err();
    assert_eq!(
        err,
        ResolveError::UnknownBundle {
            bundle: "missing".to_string(),
            provider: "overriding".to_string(),
        }
    );
}

#[test]
fn test_later_file_replaces_provider() {
    let temp_dir = TempDir::new().unwrap();
    let first = write_file(
        temp_dir.path(),
        "defs/first.toml",
        "[providers.base]\nalways = [\"strict\"]\n",
    );
    let second = write_file(
        temp_dir.path(),
        "defs/second.toml",
        "[versions]\nfeature = 1\n\n[providers.base]\nalways = [\"warnings\"]\n",
    );

    let set = DefinitionSet::load_all(&[first, second], &GeneratorRegistry::new()).unwrap();
    let base = set.provider("base").unwrap();
    assert_eq!(rendered(base.as_ref(), &Request::default()), vec!["warnings"]);
    assert_eq!(set.versions().get("feature").map(|v| v.major), Some(1));
}

#[test]
fn test_dynamic_provider_delegates_explicitly() {
    let set = DefinitionSet::from_toml_str(OVERRIDE_DEFINITIONS, &GeneratorRegistry::new()).unwrap();
    let base = set.provider("base").unwrap();

    let dynamic = DynamicProvider::new("dynamic", |call: &DynamicCall<'_>| {
        let mut directives = call.delegate()?;
        if let Some(ArgValue::Word(level)) = call.extra_args.get("--level") {
            directives.push(Directive::enable("level").with_args([level.clone()]).front());
        }
        Ok(directives)
    })
    .with_parent(Arc::clone(&base))
    .with_declared_bundles(["withSig"]);

    let request = Request::new(["withSig"]).with_arg("--level", ArgValue::Word("5".to_string()));
    assert_eq!(
        rendered(&dynamic, &request),
        vec!["<level:[5]", "strict", "feature:[signatures]"]
    );

    let err = resolve(&dynamic, &Request::new(["class"])).unwrap_err();
    assert!(matches!(err, ResolveError::UnknownBundle { .. }));
}
