//! Configuration System
//!
//! Layered configuration for the engine and its CLI: which definition files
//! to load, execution limits, and logging. Sources are merged by
//! [`ConfigLoader`] with environment overrides on top.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreambleConfig {
    /// Definition files to load, in order
    #[serde(default)]
    pub definitions: Vec<PathBuf>,

    /// Executor settings
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Executor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Maximum nesting of generators expanding into generators
    #[serde(default = "default_max_expansion_depth")]
    pub max_expansion_depth: usize,

    /// Name given to the context the CLI applies directives to
    #[serde(default = "default_context_name")]
    pub context_name: String,
}

fn default_max_expansion_depth() -> usize {
    16
}

fn default_context_name() -> String {
    "main".to_string()
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_expansion_depth: default_max_expansion_depth(),
            context_name: default_context_name(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Definitions(String),
    Execution(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Definitions(msg) => write!(f, "Definitions: {}", msg),
            ValidationError::Execution(msg) => write!(f, "Execution: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_expansion_depth == 0 {
            return Err("max_expansion_depth must be at least 1".to_string());
        }
        if self.context_name.trim().is_empty() {
            return Err("context_name cannot be empty".to_string());
        }
        Ok(())
    }
}

impl PreambleConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for path in &self.definitions {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::Definitions(
                    "definition path cannot be empty".to_string(),
                ));
            }
        }

        if let Err(e) = self.execution.validate() {
            errors.push(ValidationError::Execution(e));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all problems into one error.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }
}
