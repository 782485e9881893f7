//! Directives
//!
//! A directive is one declared intent: enable or disable a capability in the
//! target context, assert a minimum version, or expand into further directives
//! at execution time (a generator). Directives are immutable once built; the
//! builder methods consume and return a new value.

use crate::context::Context;
use crate::error::DefinitionError;
use crate::types::{parse_version, ExtraArgs, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Marker forcing a directive to the front of the resolved sequence.
pub const FRONT_MARKER: char = '<';
/// Marker forcing a directive to the back of the resolved sequence.
pub const BACK_MARKER: char = '>';
/// Marker turning an enable into a disable.
pub const DISABLE_MARKER: char = '-';
/// Marker naming a registered generator in definition files.
pub const GENERATOR_MARKER: char = '&';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Enable,
    Disable,
    Verify,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::Enable => "enable",
            ActionKind::Disable => "disable",
            ActionKind::Verify => "verify",
        };
        f.write_str(s)
    }
}

/// Forced ordering group of a directive within one resolved batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Front,
    #[default]
    Normal,
    Back,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Position::Front => "front",
            Position::Normal => "normal",
            Position::Back => "back",
        };
        f.write_str(s)
    }
}

/// What a generator sees when it is expanded.
pub struct GeneratorInput<'a> {
    pub bundle_names: &'a [String],
    pub extra_args: &'a ExtraArgs,
    /// The context with every effect committed so far.
    pub context: &'a Context,
}

pub type GeneratorFn =
    dyn Fn(&GeneratorInput<'_>) -> anyhow::Result<Vec<Directive>> + Send + Sync;

/// Named callable producing directives during execution.
#[derive(Clone)]
pub struct Generator {
    label: String,
    func: Arc<GeneratorFn>,
}

impl Generator {
    pub fn new<F>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn(&GeneratorInput<'_>) -> anyhow::Result<Vec<Directive>> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn call(&self, input: &GeneratorInput<'_>) -> anyhow::Result<Vec<Directive>> {
        (self.func)(input)
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Generator {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && Arc::ptr_eq(&self.func, &other.func)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveBody {
    /// Enable or disable `target`; `kind` is never `Verify`.
    Apply {
        target: String,
        kind: ActionKind,
        args: Vec<String>,
    },
    Verify {
        target: String,
        min_version: Version,
    },
    Generate(Generator),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    position: Position,
    body: DirectiveBody,
}

impl Directive {
    pub fn enable(target: impl Into<String>) -> Self {
        Self::apply(target, ActionKind::Enable)
    }

    pub fn disable(target: impl Into<String>) -> Self {
        Self::apply(target, ActionKind::Disable)
    }

    fn apply(target: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            position: Position::Normal,
            body: DirectiveBody::Apply {
                target: target.into(),
                kind,
                args: Vec::new(),
            },
        }
    }

    pub fn verify(target: impl Into<String>, min_version: Version) -> Self {
        Self {
            position: Position::Normal,
            body: DirectiveBody::Verify {
                target: target.into(),
                min_version,
            },
        }
    }

    /// A generator directive. Always placed in the normal group.
    pub fn generator<F>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn(&GeneratorInput<'_>) -> anyhow::Result<Vec<Directive>> + Send + Sync + 'static,
    {
        Self::from_generator(Generator::new(label, func))
    }

    pub fn from_generator(generator: Generator) -> Self {
        Self {
            position: Position::Normal,
            body: DirectiveBody::Generate(generator),
        }
    }

    /// Parse a declaration of the form `[<|>]?[-]?target`.
    pub fn parse(declaration: &str) -> Result<Self, DefinitionError> {
        let invalid = |reason: &str| DefinitionError::InvalidDeclaration {
            declaration: declaration.to_string(),
            reason: reason.to_string(),
        };

        let mut rest = declaration.trim();
        let mut position = Position::Normal;
        if let Some(stripped) = rest.strip_prefix(FRONT_MARKER) {
            position = Position::Front;
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix(BACK_MARKER) {
            position = Position::Back;
            rest = stripped;
        }

        let mut kind = ActionKind::Enable;
        if let Some(stripped) = rest.strip_prefix(DISABLE_MARKER) {
            kind = ActionKind::Disable;
            rest = stripped;
        }

        if rest.is_empty() {
            return Err(invalid("missing target"));
        }
        if rest.starts_with(GENERATOR_MARKER) {
            return Err(invalid("generators cannot carry position or disable markers"));
        }
        if rest.starts_with([FRONT_MARKER, BACK_MARKER, DISABLE_MARKER]) {
            return Err(invalid("markers must appear in the order position, disable"));
        }

        Ok(Self::apply(rest, kind).at(position))
    }

    /// Parse a `{ target = version }` declaration. Position markers are allowed on the target.
    pub fn parse_versioned(declaration: &str, version: &str) -> Result<Self, DefinitionError> {
        let parsed = Self::parse(declaration)?;
        if parsed.action_kind() == Some(ActionKind::Disable) {
            return Err(DefinitionError::InvalidDeclaration {
                declaration: declaration.to_string(),
                reason: "version checks cannot be disabled".to_string(),
            });
        }
        let min_version =
            parse_version(version).map_err(|e| DefinitionError::InvalidDeclaration {
                declaration: declaration.to_string(),
                reason: format!("invalid version '{}': {}", version, e),
            })?;
        let target = parsed.target().unwrap_or_default().to_string();
        Ok(Self::verify(target, min_version).at(parsed.position))
    }

    /// Replace the argument list. Only meaningful for enable/disable directives.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let DirectiveBody::Apply { args: current, .. } = &mut self.body {
            *current = args.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Force the ordering group. Generators stay in the normal group.
    pub fn at(mut self, position: Position) -> Self {
        if !matches!(self.body, DirectiveBody::Generate(_)) {
            self.position = position;
        }
        self
    }

    pub fn front(self) -> Self {
        self.at(Position::Front)
    }

    pub fn back(self) -> Self {
        self.at(Position::Back)
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn body(&self) -> &DirectiveBody {
        &self.body
    }

    /// Target identifier; `None` for generators.
    pub fn target(&self) -> Option<&str> {
        match &self.body {
            DirectiveBody::Apply { target, .. } | DirectiveBody::Verify { target, .. } => {
                Some(target)
            }
            DirectiveBody::Generate(_) => None,
        }
    }

    /// Action kind; `None` for generators.
    pub fn action_kind(&self) -> Option<ActionKind> {
        match &self.body {
            DirectiveBody::Apply { kind, .. } => Some(*kind),
            DirectiveBody::Verify { .. } => Some(ActionKind::Verify),
            DirectiveBody::Generate(_) => None,
        }
    }

    pub fn args(&self) -> &[String] {
        match &self.body {
            DirectiveBody::Apply { args, .. } => args,
            _ => &[],
        }
    }

    pub fn min_version(&self) -> Option<&Version> {
        match &self.body {
            DirectiveBody::Verify { min_version, .. } => Some(min_version),
            _ => None,
        }
    }

    pub fn generator_ref(&self) -> Option<&Generator> {
        match &self.body {
            DirectiveBody::Generate(generator) => Some(generator),
            _ => None,
        }
    }

    pub fn is_generator(&self) -> bool {
        matches!(self.body, DirectiveBody::Generate(_))
    }

    /// Copy of this directive with every token in `items` removed from its args.
    pub(crate) fn without_args(&self, items: &[String]) -> Self {
        let mut narrowed = self.clone();
        if let DirectiveBody::Apply { args, .. } = &mut narrowed.body {
            args.retain(|arg| !items.contains(arg));
        }
        narrowed
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Position::Front => write!(f, "{}", FRONT_MARKER)?,
            Position::Back => write!(f, "{}", BACK_MARKER)?,
            Position::Normal => {}
        }
        match &self.body {
            DirectiveBody::Apply { target, kind, args } => {
                if *kind == ActionKind::Disable {
                    write!(f, "{}", DISABLE_MARKER)?;
                }
                write!(f, "{}", target)?;
                if !args.is_empty() {
                    write!(f, ":[{}]", args.join(","))?;
                }
                Ok(())
            }
            DirectiveBody::Verify {
                target,
                min_version,
            } => write!(f, "{}>={}", target, min_version),
            DirectiveBody::Generate(generator) => {
                write!(f, "{}{}", GENERATOR_MARKER, generator.label())
            }
        }
    }
}
