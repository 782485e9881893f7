//! Definition files
//!
//! Providers declared in TOML using the directive declaration grammar:
//!
//! ```toml
//! [versions]
//! "Getopt::Long" = "2.49"
//!
//! [providers.base]
//! always = ["strict", "warnings", { "Getopt::Long" = "2.43" }, ["GetOptions"]]
//!
//! [providers.base.bundles]
//! withSig = ["feature", ["signatures"], ">-warnings", ["experimental::signatures"]]
//!
//! [providers.app]
//! parent = "base"
//! mode = "override"
//! always = ["<utf8", "&exports"]
//! ```
//!
//! A string is a declaration (`[<|>]?[-]?target`), an array is the argument
//! list of the declaration before it, and a single-entry table is a version
//! check (followed by an array, it also applies the target with those args).
//! `&name` refers to a generator registered in a [`GeneratorRegistry`].

use crate::capability::RecordingCapability;
use crate::directive::{Directive, Generator, GeneratorInput, GENERATOR_MARKER};
use crate::error::DefinitionError;
use crate::provider::{Bundle, ChainMode, ChainedProvider, DirectiveProvider, StaticProvider};
use crate::types::{parse_version, Version};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Version value as written in a definition file.
///
/// All three forms go through [`parse_version`]. A bare float such as `2.10`
/// reaches us as `2.1`, which is harmless because two-part decimals ignore
/// trailing zeros.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VersionValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl VersionValue {
    fn as_text(&self) -> String {
        match self {
            VersionValue::Text(text) => text.clone(),
            VersionValue::Integer(value) => value.to_string(),
            VersionValue::Float(value) => value.to_string(),
        }
    }
}

/// One entry of a declaration list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DeclarationItem {
    Name(String),
    Args(Vec<String>),
    Versioned(BTreeMap<String, VersionValue>),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderDefinition {
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub mode: ChainMode,
    #[serde(default)]
    pub always: Vec<DeclarationItem>,
    /// Keyed by bundle name, so bundles list in name order regardless of
    /// where they appear in the file.
    #[serde(default)]
    pub bundles: BTreeMap<String, Vec<DeclarationItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DefinitionFile {
    #[serde(default)]
    versions: BTreeMap<String, VersionValue>,
    #[serde(default)]
    providers: BTreeMap<String, ProviderDefinition>,
}

/// Generators that definition files may reference by name.
#[derive(Debug, Clone, Default)]
pub struct GeneratorRegistry {
    generators: BTreeMap<String, Generator>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&GeneratorInput<'_>) -> anyhow::Result<Vec<Directive>> + Send + Sync + 'static,
    {
        let name = name.into();
        self.generators
            .insert(name.clone(), Generator::new(name, func));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Generator> {
        self.generators.get(name)
    }
}

/// Providers and installed versions loaded from one or more definition files.
#[derive(Clone, Default)]
pub struct DefinitionSet {
    providers: BTreeMap<String, Arc<dyn DirectiveProvider>>,
    versions: BTreeMap<String, Version>,
}

impl std::fmt::Debug for DefinitionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionSet")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("versions", &self.versions)
            .finish()
    }
}

impl DefinitionSet {
    /// Load a single definition file.
    pub fn load(path: &Path, registry: &GeneratorRegistry) -> Result<Self, DefinitionError> {
        Self::load_all(&[path.to_path_buf()], registry)
    }

    /// Load several files. A provider defined again in a later file replaces the earlier one.
    pub fn load_all(
        paths: &[PathBuf],
        registry: &GeneratorRegistry,
    ) -> Result<Self, DefinitionError> {
        let mut merged = DefinitionFile::default();
        for path in paths {
            let contents = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
                path: path.clone(),
                source,
            })?;
            let file = parse_file(&contents, path)?;
            merge_into(&mut merged, file, path);
        }
        build(merged, registry, paths.first().map(PathBuf::as_path))
    }

    /// Parse definitions from a TOML string.
    pub fn from_toml_str(
        contents: &str,
        registry: &GeneratorRegistry,
    ) -> Result<Self, DefinitionError> {
        let origin = Path::new("<inline>");
        let file = parse_file(contents, origin)?;
        build(file, registry, Some(origin))
    }

    pub fn provider(&self, name: &str) -> Result<Arc<dyn DirectiveProvider>, DefinitionError> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| DefinitionError::UnknownProvider(name.to_string()))
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn versions(&self) -> &BTreeMap<String, Version> {
        &self.versions
    }

    /// Recording capability that knows the declared installed versions.
    pub fn recording_capability(&self) -> RecordingCapability {
        RecordingCapability::new().with_versions(self.versions.clone())
    }
}

fn parse_file(contents: &str, path: &Path) -> Result<DefinitionFile, DefinitionError> {
    toml::from_str(contents).map_err(|e| DefinitionError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn merge_into(merged: &mut DefinitionFile, file: DefinitionFile, path: &Path) {
    merged.versions.extend(file.versions);
    for (name, definition) in file.providers {
        if merged.providers.insert(name.clone(), definition).is_some() {
            warn!(
                provider = %name,
                path = %path.display(),
                "Provider redefined by later definition file"
            );
        }
    }
}

fn build(
    file: DefinitionFile,
    registry: &GeneratorRegistry,
    origin: Option<&Path>,
) -> Result<DefinitionSet, DefinitionError> {
    let mut versions = BTreeMap::new();
    for (target, value) in &file.versions {
        let raw = value.as_text();
        let version = parse_version(&raw).map_err(|e| DefinitionError::Parse {
            path: origin.map(Path::to_path_buf).unwrap_or_default(),
            message: format!("invalid installed version for '{}': {}", target, e),
        })?;
        versions.insert(target.clone(), version);
    }

    let mut built = BTreeMap::new();
    for name in file.providers.keys() {
        let mut visiting = Vec::new();
        build_provider(name, &file.providers, registry, &mut built, &mut visiting)?;
    }
    debug!(providers = built.len(), versions = versions.len(), "Loaded definitions");

    Ok(DefinitionSet {
        providers: built,
        versions,
    })
}

fn build_provider(
    name: &str,
    definitions: &BTreeMap<String, ProviderDefinition>,
    registry: &GeneratorRegistry,
    built: &mut BTreeMap<String, Arc<dyn DirectiveProvider>>,
    visiting: &mut Vec<String>,
) -> Result<Arc<dyn DirectiveProvider>, DefinitionError> {
    if let Some(provider) = built.get(name) {
        return Ok(Arc::clone(provider));
    }
    if visiting.iter().any(|v| v == name) {
        return Err(DefinitionError::ParentCycle(name.to_string()));
    }
    let definition = definitions
        .get(name)
        .ok_or_else(|| DefinitionError::UnknownProvider(name.to_string()))?;
    visiting.push(name.to_string());

    let mut own = StaticProvider::new(name).with_always(compile_items(&definition.always, registry)?);
    for (bundle_name, items) in &definition.bundles {
        own = own.with_bundle(Bundle::new(bundle_name.clone(), compile_items(items, registry)?)?);
    }

    let provider: Arc<dyn DirectiveProvider> = match &definition.parent {
        Some(parent_name) => {
            if !definitions.contains_key(parent_name) {
                return Err(DefinitionError::UnknownParent {
                    provider: name.to_string(),
                    parent: parent_name.clone(),
                });
            }
            let parent = build_provider(parent_name, definitions, registry, built, visiting)?;
            Arc::new(ChainedProvider::new(parent, own, definition.mode))
        }
        None => Arc::new(own),
    };

    visiting.pop();
    built.insert(name.to_string(), Arc::clone(&provider));
    Ok(provider)
}

/// Compile a declaration list into directives.
pub fn compile_items(
    items: &[DeclarationItem],
    registry: &GeneratorRegistry,
) -> Result<Vec<Directive>, DefinitionError> {
    let mut directives = Vec::new();
    let mut iter = items.iter().peekable();

    while let Some(item) = iter.next() {
        let args = match iter.next_if(|next| matches!(next, DeclarationItem::Args(_))) {
            Some(DeclarationItem::Args(args)) => Some(args),
            _ => None,
        };

        match item {
            DeclarationItem::Name(name) => {
                if let Some(generator_name) = name.strip_prefix(GENERATOR_MARKER) {
                    if args.is_some() {
                        return Err(DefinitionError::InvalidDeclaration {
                            declaration: name.clone(),
                            reason: "generators do not take an argument list".to_string(),
                        });
                    }
                    let generator = registry
                        .get(generator_name)
                        .ok_or_else(|| DefinitionError::UnknownGenerator(generator_name.to_string()))?;
                    directives.push(Directive::from_generator(generator.clone()));
                    continue;
                }

                let directive = Directive::parse(name)?;
                directives.push(match args {
                    Some(args) => directive.with_args(args.iter().cloned()),
                    None => directive,
                });
            }
            DeclarationItem::Versioned(entries) => {
                let mut entries = entries.iter();
                let (declaration, version) = match (entries.next(), entries.next()) {
                    (Some(entry), None) => entry,
                    _ => {
                        return Err(DefinitionError::InvalidDeclaration {
                            declaration: format!("{:?}", item),
                            reason: "a version check names exactly one target".to_string(),
                        })
                    }
                };
                directives.push(Directive::parse_versioned(declaration, &version.as_text())?);
                if let Some(args) = args {
                    directives.push(Directive::parse(declaration)?.with_args(args.iter().cloned()));
                }
            }
            DeclarationItem::Args(args) => {
                return Err(DefinitionError::InvalidDeclaration {
                    declaration: format!("{:?}", args),
                    reason: "argument list without a preceding declaration".to_string(),
                });
            }
        }
    }

    Ok(directives)
}
