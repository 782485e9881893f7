//! CLI output: error mapping from engine errors to stable CLI surface.

use crate::cli::presentation::format_journal_table;
use crate::error::{ApiError, DefinitionError, ExecutionError, ResolveError};

/// Map engine errors to a string for CLI output, prefixed with a stable category.
///
/// A partial apply also lists the effects that stayed committed.
pub fn map_error(e: &ApiError) -> String {
    let category = match e {
        ApiError::Resolve(ResolveError::MalformedRequest(_)) => "request",
        ApiError::Resolve(ResolveError::UnknownBundle { .. }) => "bundle",
        ApiError::Execution(ExecutionError::Version(_))
        | ApiError::PartialApply {
            source: ExecutionError::Version(_),
            ..
        } => "version",
        ApiError::Execution(_) | ApiError::PartialApply { .. } => "execution",
        ApiError::Definition(DefinitionError::Io { .. })
        | ApiError::Definition(DefinitionError::Parse { .. }) => "definitions",
        ApiError::Definition(_) => "definition",
        ApiError::ConfigError(_) => "config",
        ApiError::Serialization(_) => "output",
    };
    let message = format!("error[{}]: {}", category, e);
    match e {
        ApiError::PartialApply { journal, .. } if !journal.is_empty() => format!(
            "{}\nApplied before the failure:\n{}",
            message,
            format_journal_table(journal)
        ),
        _ => message,
    }
}
