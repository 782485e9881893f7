//! Directive Providers
//!
//! A provider answers one question: given the requested bundle names and the
//! call-site arguments, which directives apply, in declaration order? That is
//! the always-list followed by each requested bundle, in request order.
//!
//! Three variants exist:
//! - [`StaticProvider`]: a fixed always-list and bundle table.
//! - [`ChainedProvider`]: resolves through an explicit parent first, then adds
//!   (or overrides with) its own always-list and bundles.
//! - [`DynamicProvider`]: an arbitrary function, optionally handed a parent to
//!   delegate to.
//!
//! Providers never merge implicitly. A provider only sees another provider's
//! directives when it is built with that provider as its parent.

use crate::directive::Directive;
use crate::error::{DefinitionError, ResolveError};
use crate::request::RESERVED_PREFIX;
use crate::types::ExtraArgs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Source of directives for a call context.
pub trait DirectiveProvider: Send + Sync {
    /// Provider name used in errors and logs.
    fn name(&self) -> &str;

    /// Whether `bundle` can be requested from this provider.
    fn knows_bundle(&self, bundle: &str) -> bool;

    /// Bundle names this provider can list. The order is stable but
    /// provider-specific: code-built providers keep insertion order, providers
    /// loaded from definition files list bundles by name, and chained providers
    /// list the parent's names before the child's new ones.
    fn bundle_names(&self) -> Vec<String>;

    /// Always-directives followed by the directives of every requested bundle.
    fn resolve_base(
        &self,
        bundle_names: &[String],
        extra_args: &ExtraArgs,
    ) -> Result<Vec<Directive>, ResolveError>;
}

/// Named, ordered group of directives.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    name: String,
    directives: Vec<Directive>,
}

impl Bundle {
    pub fn new(name: impl Into<String>, directives: Vec<Directive>) -> Result<Self, DefinitionError> {
        let name = name.into();
        if name.is_empty() || name.starts_with(RESERVED_PREFIX) {
            return Err(DefinitionError::InvalidBundleName(name));
        }
        Ok(Self { name, directives })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }
}

/// Fixed always-list plus bundle table.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    name: String,
    always: Vec<Directive>,
    bundles: Vec<Bundle>,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            always: Vec::new(),
            bundles: Vec::new(),
        }
    }

    pub fn with_always(mut self, directives: Vec<Directive>) -> Self {
        self.always = directives;
        self
    }

    /// Add a bundle, replacing any earlier bundle with the same name.
    pub fn with_bundle(mut self, bundle: Bundle) -> Self {
        match self.bundles.iter_mut().find(|b| b.name == bundle.name) {
            Some(existing) => *existing = bundle,
            None => self.bundles.push(bundle),
        }
        self
    }

    pub fn always(&self) -> &[Directive] {
        &self.always
    }

    pub fn bundle(&self, name: &str) -> Option<&Bundle> {
        self.bundles.iter().find(|b| b.name == name)
    }
}

impl DirectiveProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn knows_bundle(&self, bundle: &str) -> bool {
        self.bundle(bundle).is_some()
    }

    fn bundle_names(&self) -> Vec<String> {
        self.bundles.iter().map(|b| b.name.clone()).collect()
    }

    fn resolve_base(
        &self,
        bundle_names: &[String],
        _extra_args: &ExtraArgs,
    ) -> Result<Vec<Directive>, ResolveError> {
        let mut directives = self.always.clone();
        for name in bundle_names {
            let bundle = self
                .bundle(name)
                .ok_or_else(|| unknown_bundle(name, &self.name))?;
            directives.extend(bundle.directives.iter().cloned());
        }
        Ok(directives)
    }
}

/// How a chained provider treats a bundle its parent also defines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainMode {
    /// Parent's directives first, then the child's.
    #[default]
    Extend,
    /// The child's definition replaces the parent's.
    Override,
}

impl fmt::Display for ChainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainMode::Extend => f.write_str("extend"),
            ChainMode::Override => f.write_str("override"),
        }
    }
}

/// Provider that delegates to a parent, then appends its own directives.
///
/// Resolution order: the parent's resolution for the requested bundles it
/// handles, then this provider's always-list, then this provider's bundles
/// in request order.
#[derive(Clone)]
pub struct ChainedProvider {
    parent: Arc<dyn DirectiveProvider>,
    own: StaticProvider,
    mode: ChainMode,
}

impl ChainedProvider {
    pub fn new(parent: Arc<dyn DirectiveProvider>, own: StaticProvider, mode: ChainMode) -> Self {
        Self { parent, own, mode }
    }

    pub fn parent(&self) -> &Arc<dyn DirectiveProvider> {
        &self.parent
    }

    pub fn mode(&self) -> ChainMode {
        self.mode
    }

    fn parent_handles(&self, bundle: &str) -> bool {
        if !self.parent.knows_bundle(bundle) {
            return false;
        }
        match self.mode {
            ChainMode::Extend => true,
            ChainMode::Override => !self.own.knows_bundle(bundle),
        }
    }
}

impl fmt::Debug for ChainedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedProvider")
            .field("name", &self.own.name)
            .field("parent", &self.parent.name())
            .field("mode", &self.mode)
            .finish()
    }
}

impl DirectiveProvider for ChainedProvider {
    fn name(&self) -> &str {
        &self.own.name
    }

    fn knows_bundle(&self, bundle: &str) -> bool {
        self.own.knows_bundle(bundle) || self.parent.knows_bundle(bundle)
    }

    fn bundle_names(&self) -> Vec<String> {
        let mut names = self.parent.bundle_names();
        for name in self.own.bundle_names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn resolve_base(
        &self,
        bundle_names: &[String],
        extra_args: &ExtraArgs,
    ) -> Result<Vec<Directive>, ResolveError> {
        if let Some(unknown) = bundle_names.iter().find(|name| !self.knows_bundle(name)) {
            return Err(unknown_bundle(unknown, self.name()));
        }

        let delegated: Vec<String> = bundle_names
            .iter()
            .filter(|name| self.parent_handles(name))
            .cloned()
            .collect();

        let mut directives = self.parent.resolve_base(&delegated, extra_args)?;
        directives.extend(self.own.always.iter().cloned());
        for name in bundle_names {
            if let Some(bundle) = self.own.bundle(name) {
                directives.extend(bundle.directives.iter().cloned());
            }
        }
        Ok(directives)
    }
}

/// Arguments handed to a dynamic provider's function.
pub struct DynamicCall<'a> {
    pub provider: &'a str,
    pub bundle_names: &'a [String],
    pub extra_args: &'a ExtraArgs,
    /// Explicit delegation target, if the provider was built with one.
    pub parent: Option<&'a dyn DirectiveProvider>,
}

impl DynamicCall<'_> {
    /// Resolve through the parent, or return nothing when there is none.
    pub fn delegate(&self) -> Result<Vec<Directive>, ResolveError> {
        match self.parent {
            Some(parent) => parent.resolve_base(self.bundle_names, self.extra_args),
            None => Ok(Vec::new()),
        }
    }

    pub fn unknown_bundle(&self, bundle: &str) -> ResolveError {
        unknown_bundle(bundle, self.provider)
    }
}

pub type DynamicFn =
    dyn Fn(&DynamicCall<'_>) -> Result<Vec<Directive>, ResolveError> + Send + Sync;

/// Provider backed by an arbitrary function.
#[derive(Clone)]
pub struct DynamicProvider {
    name: String,
    declared_bundles: Option<Vec<String>>,
    parent: Option<Arc<dyn DirectiveProvider>>,
    func: Arc<DynamicFn>,
}

impl DynamicProvider {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&DynamicCall<'_>) -> Result<Vec<Directive>, ResolveError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            declared_bundles: None,
            parent: None,
            func: Arc::new(func),
        }
    }

    /// Restrict requests to these bundle names; others fail before the function runs.
    pub fn with_declared_bundles<I, S>(mut self, bundles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_bundles = Some(bundles.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_parent(mut self, parent: Arc<dyn DirectiveProvider>) -> Self {
        self.parent = Some(parent);
        self
    }
}

impl fmt::Debug for DynamicProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicProvider")
            .field("name", &self.name)
            .field("declared_bundles", &self.declared_bundles)
            .field("parent", &self.parent.as_ref().map(|p| p.name().to_string()))
            .finish_non_exhaustive()
    }
}

impl DirectiveProvider for DynamicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn knows_bundle(&self, bundle: &str) -> bool {
        match &self.declared_bundles {
            Some(declared) => declared.iter().any(|name| name == bundle),
            None => true,
        }
    }

    fn bundle_names(&self) -> Vec<String> {
        self.declared_bundles.clone().unwrap_or_default()
    }

    fn resolve_base(
        &self,
        bundle_names: &[String],
        extra_args: &ExtraArgs,
    ) -> Result<Vec<Directive>, ResolveError> {
        if let Some(unknown) = bundle_names.iter().find(|name| !self.knows_bundle(name)) {
            return Err(unknown_bundle(unknown, &self.name));
        }
        let call = DynamicCall {
            provider: &self.name,
            bundle_names,
            extra_args,
            parent: self.parent.as_deref(),
        };
        (self.func)(&call)
    }
}

fn unknown_bundle(bundle: &str, provider: &str) -> ResolveError {
    ResolveError::UnknownBundle {
        bundle: bundle.to_string(),
        provider: provider.to_string(),
    }
}
