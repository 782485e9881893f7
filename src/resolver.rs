//! Resolver
//!
//! Turns a provider and a request into the final ordered directive sequence.
//! Pure: no I/O, no side effects, same inputs give the same sequence.
//!
//! Steps:
//! 1. validate the request shape,
//! 2. ask the provider for always-directives plus requested bundles,
//! 3. stable-partition by position (front, normal, back),
//! 4. apply exclusions in request order.

use crate::directive::{Directive, Position};
use crate::error::ResolveError;
use crate::provider::DirectiveProvider;
use crate::request::{Exclusion, Request, RequestToken};
use serde_json::json;
use tracing::debug;

/// Ordered, exclusion-applied directives together with the request that produced them.
#[derive(Debug, Clone)]
pub struct Resolution {
    provider: String,
    request: Request,
    directives: Vec<Directive>,
}

impl Resolution {
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn into_directives(self) -> Vec<Directive> {
        self.directives
    }

    /// Machine-readable view of the resolved sequence.
    pub fn to_json(&self) -> serde_json::Value {
        let directives: Vec<serde_json::Value> = self
            .directives
            .iter()
            .map(|directive| {
                json!({
                    "declaration": directive.to_string(),
                    "target": directive.target(),
                    "kind": directive.action_kind(),
                    "position": directive.position(),
                    "args": directive.args(),
                    "min_version": directive.min_version().map(|v| v.to_string()),
                    "generator": directive.generator_ref().map(|g| g.label().to_string()),
                })
            })
            .collect();
        json!({
            "provider": self.provider,
            "request": self.request,
            "directives": directives,
        })
    }
}

/// Resolve a request against a provider.
pub fn resolve(
    provider: &dyn DirectiveProvider,
    request: &Request,
) -> Result<Resolution, ResolveError> {
    request.validate()?;

    let base = provider.resolve_base(&request.bundle_names, &request.extra_args)?;
    debug!(
        provider = provider.name(),
        bundles = ?request.bundle_names,
        base_count = base.len(),
        "Resolved base directives"
    );

    let ordered = order_by_position(base);
    let directives = apply_exclusions(ordered, &request.exclusions);
    debug!(
        provider = provider.name(),
        resolved_count = directives.len(),
        exclusions = request.exclusions.len(),
        "Resolution complete"
    );

    Ok(Resolution {
        provider: provider.name().to_string(),
        request: request.clone(),
        directives,
    })
}

/// Parse a flat token stream and resolve it.
pub fn resolve_tokens(
    provider: &dyn DirectiveProvider,
    tokens: &[RequestToken],
) -> Result<Resolution, ResolveError> {
    let request = Request::parse(tokens)?;
    resolve(provider, &request)
}

/// Stable partition into front ++ normal ++ back.
fn order_by_position(directives: Vec<Directive>) -> Vec<Directive> {
    let mut front = Vec::new();
    let mut normal = Vec::new();
    let mut back = Vec::new();

    for directive in directives {
        match directive.position() {
            Position::Front => front.push(directive),
            Position::Normal => normal.push(directive),
            Position::Back => back.push(directive),
        }
    }

    front.extend(normal);
    front.extend(back);
    front
}

fn apply_exclusions(mut directives: Vec<Directive>, exclusions: &[Exclusion]) -> Vec<Directive> {
    for exclusion in exclusions {
        let target = exclusion.target.as_str();
        match &exclusion.sub_items {
            None => {
                let before = directives.len();
                directives.retain(|directive| directive.target() != Some(target));
                debug!(
                    excluded = target,
                    removed = before - directives.len(),
                    "Excluded directives"
                );
            }
            Some(items) => {
                for directive in directives.iter_mut() {
                    if directive.target() == Some(target) {
                        *directive = directive.without_args(items);
                    }
                }
                debug!(excluded = target, items = ?items, "Excluded directive arguments");
            }
        }
    }
    directives
}
