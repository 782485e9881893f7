//! Executor: walks a resolved sequence against an action capability.
//! Stops at the first failure; effects already committed stay on the context.

use crate::capability::ActionCapability;
use crate::config::ExecutionConfig;
use crate::context::Context;
use crate::directive::{Directive, DirectiveBody, GeneratorInput};
use crate::error::ExecutionError;
use crate::request::Request;
use crate::resolver::Resolution;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Counts for one executed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Batch number on the context.
    pub batch: usize,
    /// Enable/disable directives applied, including generator output.
    pub applied: usize,
    /// Version assertions checked.
    pub verified: usize,
    /// Generators expanded.
    pub expanded: usize,
}

pub struct Executor {
    max_expansion_depth: usize,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_EXPANSION_DEPTH)
    }
}

impl Executor {
    pub const DEFAULT_MAX_EXPANSION_DEPTH: usize = 16;

    pub fn new(max_expansion_depth: usize) -> Self {
        Self {
            max_expansion_depth,
        }
    }

    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self::new(config.max_expansion_depth)
    }

    /// Execute a resolution. Generators see the resolution's request.
    pub fn execute<C>(
        &self,
        resolution: &Resolution,
        capability: &C,
        context: &mut Context,
    ) -> Result<ExecutionReport, ExecutionError>
    where
        C: ActionCapability + ?Sized,
    {
        self.execute_directives(resolution.directives(), resolution.request(), capability, context)
    }

    /// Execute an already ordered sequence in the scope of `request`.
    pub fn execute_directives<C>(
        &self,
        directives: &[Directive],
        request: &Request,
        capability: &C,
        context: &mut Context,
    ) -> Result<ExecutionReport, ExecutionError>
    where
        C: ActionCapability + ?Sized,
    {
        let batch = context.begin_batch();
        let mut report = ExecutionReport {
            batch,
            ..ExecutionReport::default()
        };
        info!(
            context = context.name(),
            batch,
            directives = directives.len(),
            "Executing directive batch"
        );

        for directive in directives {
            if let Err(err) = self.run(directive, request, capability, context, 0, &mut report) {
                warn!(
                    context = context.name(),
                    batch,
                    applied = report.applied,
                    error = %err,
                    "Directive batch stopped"
                );
                return Err(err);
            }
        }

        info!(
            context = context.name(),
            batch,
            applied = report.applied,
            verified = report.verified,
            expanded = report.expanded,
            "Directive batch complete"
        );
        Ok(report)
    }

    fn run<C>(
        &self,
        directive: &Directive,
        request: &Request,
        capability: &C,
        context: &mut Context,
        depth: usize,
        report: &mut ExecutionReport,
    ) -> Result<(), ExecutionError>
    where
        C: ActionCapability + ?Sized,
    {
        match directive.body() {
            DirectiveBody::Verify {
                target,
                min_version,
            } => {
                debug!(directive_target = %target, min_version = %min_version, "Checking version");
                capability.check_version(target, min_version)?;
                report.verified += 1;
            }
            DirectiveBody::Apply { target, kind, args } => {
                debug!(directive_target = %target, kind = %kind, args = ?args, "Applying directive");
                capability.apply(target, *kind, args, context)?;
                context.record(target, *kind, args);
                report.applied += 1;
            }
            DirectiveBody::Generate(generator) => {
                if depth >= self.max_expansion_depth {
                    return Err(ExecutionError::ExpansionDepth {
                        label: generator.label().to_string(),
                        limit: self.max_expansion_depth,
                    });
                }

                let input = GeneratorInput {
                    bundle_names: &request.bundle_names,
                    extra_args: &request.extra_args,
                    context: &*context,
                };
                let expansion = generator
                    .call(&input)
                    .map_err(|e| ExecutionError::Generator {
                        label: generator.label().to_string(),
                        reason: format!("{:#}", e),
                    })?;
                report.expanded += 1;
                debug!(
                    generator = generator.label(),
                    depth,
                    produced = expansion.len(),
                    "Expanded generator"
                );

                for sub_directive in &expansion {
                    self.run(sub_directive, request, capability, context, depth + 1, report)?;
                }
            }
        }
        Ok(())
    }
}
