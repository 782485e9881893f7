//! Runtime applier
//!
//! Re-runs resolution and execution against a context that has already been
//! set up, for effects that cannot happen during the initial batch. Each call
//! is its own batch: front/back ordering applies within it, never across
//! earlier batches on the same context.

use crate::capability::ActionCapability;
use crate::context::Context;
use crate::error::ApiError;
use crate::executor::{ExecutionReport, Executor};
use crate::provider::DirectiveProvider;
use crate::request::Request;
use crate::resolver::{resolve, Resolution};
use crate::types::ExtraArgs;
use std::sync::Arc;
use tracing::info;

/// Resolve `bundle_names` against `provider` and execute the result on `context`.
pub fn apply_bundles<C>(
    provider: &dyn DirectiveProvider,
    bundle_names: &[String],
    extra_args: &ExtraArgs,
    capability: &C,
    context: &mut Context,
) -> Result<ExecutionReport, ApiError>
where
    C: ActionCapability + ?Sized,
{
    apply_with(
        &Executor::default(),
        provider,
        bundle_names,
        extra_args,
        capability,
        context,
    )
}

fn apply_with<C>(
    executor: &Executor,
    provider: &dyn DirectiveProvider,
    bundle_names: &[String],
    extra_args: &ExtraArgs,
    capability: &C,
    context: &mut Context,
) -> Result<ExecutionReport, ApiError>
where
    C: ActionCapability + ?Sized,
{
    let request = Request {
        bundle_names: bundle_names.to_vec(),
        exclusions: Vec::new(),
        extra_args: extra_args.clone(),
    };
    let resolution = resolve(provider, &request)?;
    info!(
        provider = provider.name(),
        context = context.name(),
        previous_batches = context.batches(),
        directives = resolution.len(),
        "Applying bundles at runtime"
    );
    Ok(executor.execute(&resolution, capability, context)?)
}

/// Provider and executor bound together for repeated runtime application.
pub struct RuntimeApplier {
    provider: Arc<dyn DirectiveProvider>,
    executor: Executor,
}

impl RuntimeApplier {
    pub fn new(provider: Arc<dyn DirectiveProvider>) -> Self {
        Self::with_executor(provider, Executor::default())
    }

    pub fn with_executor(provider: Arc<dyn DirectiveProvider>, executor: Executor) -> Self {
        Self { provider, executor }
    }

    pub fn provider(&self) -> &dyn DirectiveProvider {
        self.provider.as_ref()
    }

    /// Resolve a full request (exclusions included) without executing it.
    pub fn plan(&self, request: &Request) -> Result<Resolution, ApiError> {
        Ok(resolve(self.provider.as_ref(), request)?)
    }

    /// Resolve and execute a full request, e.g. for the context's initial batch.
    pub fn apply_request<C>(
        &self,
        request: &Request,
        capability: &C,
        context: &mut Context,
    ) -> Result<ExecutionReport, ApiError>
    where
        C: ActionCapability + ?Sized,
    {
        let resolution = self.plan(request)?;
        Ok(self.executor.execute(&resolution, capability, context)?)
    }

    /// Apply bundles on demand after initial setup.
    pub fn apply_bundles<C>(
        &self,
        bundle_names: &[String],
        extra_args: &ExtraArgs,
        capability: &C,
        context: &mut Context,
    ) -> Result<ExecutionReport, ApiError>
    where
        C: ActionCapability + ?Sized,
    {
        apply_with(
            &self.executor,
            self.provider.as_ref(),
            bundle_names,
            extra_args,
            capability,
            context,
        )
    }
}
