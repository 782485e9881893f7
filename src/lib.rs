//! Preamble: Declarative Directive Resolution
//!
//! Turns a request for named bundles into an ordered sequence of enable,
//! disable, version-check, and generator directives, then executes that
//! sequence against a target context through a pluggable action capability.
//!
//! Resolution is pure: [`resolver::resolve`] takes the always-directives and
//! requested bundles from a [`provider::DirectiveProvider`], moves forced
//! front/back directives into place, and applies exclusions. Execution
//! ([`executor::Executor`]) is where effects happen and where generators
//! expand against the context as it stands.

pub mod capability;
pub mod cli;
pub mod config;
pub mod context;
pub mod definition;
pub mod directive;
pub mod error;
pub mod executor;
pub mod logging;
pub mod provider;
pub mod request;
pub mod resolver;
pub mod runtime;
pub mod types;

pub use capability::{ActionCapability, RecordingCapability};
pub use context::{AppliedEffect, Context};
pub use directive::{ActionKind, Directive, Generator, GeneratorInput, Position};
pub use error::{ApiError, DefinitionError, ExecutionError, ResolveError};
pub use executor::{ExecutionReport, Executor};
pub use provider::{Bundle, ChainMode, ChainedProvider, DirectiveProvider, DynamicProvider, StaticProvider};
pub use request::{Exclusion, Request, RequestToken};
pub use resolver::{resolve, Resolution};
pub use runtime::{apply_bundles, RuntimeApplier};
