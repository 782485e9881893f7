//! Execution context
//!
//! The target that directives are applied to. The executor appends every
//! committed enable/disable to the journal, so generators and later runtime
//! batches observe what earlier steps already did.

use crate::directive::ActionKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One committed enable/disable effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedEffect {
    pub target: String,
    pub kind: ActionKind,
    pub args: Vec<String>,
    /// Batch number the effect was committed in (starting at 1).
    pub batch: usize,
}

/// Target execution context.
#[derive(Debug, Clone, Default)]
pub struct Context {
    name: String,
    journal: Vec<AppliedEffect>,
    attributes: BTreeMap<String, serde_json::Value>,
    batches: usize,
}

impl Context {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effects committed so far, oldest first.
    pub fn journal(&self) -> &[AppliedEffect] {
        &self.journal
    }

    /// Number of execution batches started against this context.
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Whether the most recent effect recorded for `target` was an enable.
    pub fn is_enabled(&self, target: &str) -> bool {
        self.journal
            .iter()
            .rev()
            .find(|effect| effect.target == target)
            .map(|effect| effect.kind == ActionKind::Enable)
            .unwrap_or(false)
    }

    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.attributes
    }

    /// Set a capability-defined attribute. Returns the previous value.
    pub fn set_attribute(
        &mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.attributes.insert(key.into(), value)
    }

    /// Drop a capability-defined attribute. Returns the removed value.
    pub fn remove_attribute(&mut self, key: &str) -> Option<serde_json::Value> {
        self.attributes.remove(key)
    }

    pub(crate) fn begin_batch(&mut self) -> usize {
        self.batches += 1;
        self.batches
    }

    pub(crate) fn record(&mut self, target: &str, kind: ActionKind, args: &[String]) {
        self.journal.push(AppliedEffect {
            target: target.to_string(),
            kind,
            args: args.to_vec(),
            batch: self.batches,
        });
    }
}
