//! Action capability
//!
//! The collaborator that actually makes an enable/disable happen, and that
//! knows which versions are installed. The engine only orders and filters
//! directives; everything a capability does to the context is its own business.

use crate::context::Context;
use crate::directive::ActionKind;
use crate::error::{ActionError, VersionError};
use crate::types::Version;
use serde_json::json;
use std::collections::BTreeMap;

/// Performs effects on a context. Calls are synchronous and side-effecting.
pub trait ActionCapability {
    /// Enable or disable `target` in `context`. `args` may be empty, which means
    /// "apply with no arguments", never "skip".
    fn apply(
        &self,
        target: &str,
        kind: ActionKind,
        args: &[String],
        context: &mut Context,
    ) -> Result<(), ActionError>;

    /// Assert that `target` is available at `min_version` or newer.
    fn check_version(&self, target: &str, min_version: &Version) -> Result<(), VersionError>;
}

/// Attribute key under which [`RecordingCapability`] stores an effect.
pub fn effect_key(kind: ActionKind, target: &str) -> String {
    format!("{}:{}", kind, target)
}

/// In-process capability that records effects as context attributes.
///
/// An enable stores the argument list under `enable:<target>` and removes any
/// `disable:<target>`; a disable does the reverse.
#[derive(Debug, Clone, Default)]
pub struct RecordingCapability {
    versions: BTreeMap<String, Version>,
    rejected: BTreeMap<String, String>,
}

impl RecordingCapability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `target` as installed at `version`.
    pub fn with_version(mut self, target: impl Into<String>, version: Version) -> Self {
        self.versions.insert(target.into(), version);
        self
    }

    pub fn with_versions(mut self, versions: BTreeMap<String, Version>) -> Self {
        self.versions.extend(versions);
        self
    }

    /// Make every enable/disable of `target` fail with `reason`.
    pub fn reject(mut self, target: impl Into<String>, reason: impl Into<String>) -> Self {
        self.rejected.insert(target.into(), reason.into());
        self
    }

    pub fn installed_version(&self, target: &str) -> Option<&Version> {
        self.versions.get(target)
    }
}

impl ActionCapability for RecordingCapability {
    fn apply(
        &self,
        target: &str,
        kind: ActionKind,
        args: &[String],
        context: &mut Context,
    ) -> Result<(), ActionError> {
        if let Some(reason) = self.rejected.get(target) {
            return Err(ActionError {
                target: target.to_string(),
                kind,
                reason: reason.clone(),
            });
        }

        let opposite = match kind {
            ActionKind::Enable => ActionKind::Disable,
            ActionKind::Disable => ActionKind::Enable,
            ActionKind::Verify => {
                return Err(ActionError {
                    target: target.to_string(),
                    kind,
                    reason: "verify is not an applicable action".to_string(),
                })
            }
        };

        context.set_attribute(effect_key(kind, target), json!(args));
        context.remove_attribute(&effect_key(opposite, target));
        Ok(())
    }

    fn check_version(&self, target: &str, min_version: &Version) -> Result<(), VersionError> {
        match self.versions.get(target) {
            Some(installed) if installed >= min_version => Ok(()),
            Some(installed) => Err(VersionError {
                target: target.to_string(),
                required: min_version.to_string(),
                found: installed.to_string(),
            }),
            None => Err(VersionError {
                target: target.to_string(),
                required: min_version.to_string(),
                found: "not installed".to_string(),
            }),
        }
    }
}
