//! Shared value types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use semver::Version;

/// Value attached to a custom request argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Word(String),
    List(Vec<String>),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Word(word) => write!(f, "{}", word),
            ArgValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Custom call-site arguments keyed by their prefixed name (e.g. `--flavor`).
///
/// Ordered so that anything derived from the map is deterministic.
pub type ExtraArgs = BTreeMap<String, ArgValue>;

/// Parse a version string, accepting the forms module authors tend to write.
///
/// - `2` becomes `2.0.0`.
/// - A two-part decimal such as `2.43` or `1.07` is read as a decimal number:
///   the fraction is right-padded to six digits and split into minor and patch
///   in groups of three (`2.43` -> `2.430.0`, `1.07` -> `1.70.0`,
///   `1.000001` -> `1.0.1`). Trailing zeros never change the result, so `2.1`
///   and `2.10` are the same version. Fractions longer than six digits are
///   rejected.
/// - A `v` prefix or three or more parts (`v2.43`, `1.02.3`) is read as dotted
///   components, with leading zeros dropped from each.
///
/// Pre-release and build suffixes (`-beta.1`, `+build`) are kept.
pub fn parse_version(raw: &str) -> Result<Version, semver::Error> {
    let trimmed = raw.trim();
    let (dotted, body) = match trimmed.strip_prefix('v') {
        Some(body) => (true, body),
        None => (false, trimmed),
    };

    let (core, rest) = match body.find(['-', '+']) {
        Some(idx) => body.split_at(idx),
        None => (body, ""),
    };

    let parts: Vec<&str> = core.split('.').collect();
    let normalized = match parts.as_slice() {
        [major] => format!("{}.0.0", strip_leading_zeros(major)),
        [major, fraction] if !dotted => decimal_to_dotted(major, fraction),
        [major, minor] => format!(
            "{}.{}.0",
            strip_leading_zeros(major),
            strip_leading_zeros(minor)
        ),
        _ => parts
            .iter()
            .map(|part| strip_leading_zeros(part))
            .collect::<Vec<_>>()
            .join("."),
    };

    Version::parse(&format!("{}{}", normalized, rest))
}

const DECIMAL_DIGITS: usize = 6;

fn decimal_to_dotted(major: &str, fraction: &str) -> String {
    let is_digits = !fraction.is_empty() && fraction.bytes().all(|b| b.is_ascii_digit());
    if !is_digits || fraction.len() > DECIMAL_DIGITS {
        // Left as two parts so semver reports it.
        return format!("{}.{}", major, fraction);
    }
    let padded = format!("{:0<width$}", fraction, width = DECIMAL_DIGITS);
    let (minor, patch) = padded.split_at(DECIMAL_DIGITS / 2);
    format!(
        "{}.{}.{}",
        strip_leading_zeros(major),
        strip_leading_zeros(minor),
        strip_leading_zeros(patch)
    )
}

fn strip_leading_zeros(part: &str) -> String {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return part.to_string();
    }
    match part.trim_start_matches('0') {
        "" => "0".to_string(),
        digits => digits.to_string(),
    }
}
