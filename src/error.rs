//! Error types for the preamble directive resolution engine.

use crate::context::AppliedEffect;
use crate::directive::ActionKind;
use thiserror::Error;

/// Resolution-time errors. Raised before any directive is executed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Unknown bundle '{bundle}' requested from provider '{provider}'")]
    UnknownBundle { bundle: String, provider: String },
}

/// An enable/disable rejected by the action capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to {kind} {target}: {reason}")]
pub struct ActionError {
    pub target: String,
    pub kind: ActionKind,
    pub reason: String,
}

/// A version assertion the installed capability does not satisfy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Version check failed for {target}: requires {required}, found {found}")]
pub struct VersionError {
    pub target: String,
    pub required: String,
    pub found: String,
}

/// Execution-time errors. Effects committed before the failure stay in place.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("Generator '{label}' failed: {reason}")]
    Generator { label: String, reason: String },

    #[error("Generator '{label}' exceeded the expansion depth limit of {limit}")]
    ExpansionDepth { label: String, limit: usize },
}

/// Errors in directive definition files and provider construction.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Invalid declaration '{declaration}': {reason}")]
    InvalidDeclaration { declaration: String, reason: String },

    #[error("Invalid bundle name '{0}': bundle names must be non-empty and must not start with '-'")]
    InvalidBundleName(String),

    #[error("Provider '{provider}' references unknown parent '{parent}'")]
    UnknownParent { provider: String, parent: String },

    #[error("Provider inheritance cycle through '{0}'")]
    ParentCycle(String),

    #[error("Unknown generator '{0}'")]
    UnknownGenerator(String),

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("Failed to read definition file {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse definition file {path}: {message}")]
    Parse {
        path: std::path::PathBuf,
        message: String,
    },
}

/// Umbrella error returned by the public entry points.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// Execution stopped after some effects were already committed.
    #[error("{source} ({} effect(s) applied before the failure)", .journal.len())]
    PartialApply {
        source: ExecutionError,
        journal: Vec<AppliedEffect>,
    },

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
