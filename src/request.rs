//! Call-site requests
//!
//! A request names the bundles to pull in, the directives (or argument tokens)
//! to exclude, and free-form custom arguments. Call sites express it as one flat
//! token stream: bundle names first, then `-exclude [..]`, then `--key value`
//! pairs. Anything out of that order is rejected.

use crate::error::ResolveError;
use crate::types::{ArgValue, ExtraArgs};
use serde::{Deserialize, Serialize};

/// Reserved key introducing the exclusion list.
pub const EXCLUDE_KEY: &str = "-exclude";
/// Prefix of every engine-reserved key.
pub const RESERVED_PREFIX: char = '-';
/// Prefix of custom argument keys.
pub const CUSTOM_PREFIX: &str = "--";

/// Request-time filter on resolved directives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub target: String,
    /// `None` drops matching directives; `Some` removes only these argument tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_items: Option<Vec<String>>,
}

impl Exclusion {
    pub fn whole(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            sub_items: None,
        }
    }

    pub fn items<I, S>(target: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: target.into(),
            sub_items: Some(items.into_iter().map(Into::into).collect()),
        }
    }
}

/// One token of the flat request stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestToken {
    Word(String),
    List(Vec<RequestToken>),
}

impl RequestToken {
    pub fn word(word: impl Into<String>) -> Self {
        RequestToken::Word(word.into())
    }

    pub fn list<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = RequestToken>,
    {
        RequestToken::List(tokens.into_iter().collect())
    }

    /// A list made only of words.
    pub fn words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RequestToken::List(words.into_iter().map(RequestToken::word).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub bundle_names: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    #[serde(default)]
    pub extra_args: ExtraArgs,
}

impl Request {
    pub fn new<I, S>(bundle_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bundle_names: bundle_names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn exclude(mut self, exclusion: Exclusion) -> Self {
        self.exclusions.push(exclusion);
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: ArgValue) -> Self {
        self.extra_args.insert(key.into(), value);
        self
    }

    /// Parse a flat token stream.
    pub fn parse(tokens: &[RequestToken]) -> Result<Self, ResolveError> {
        let mut request = Request::default();
        let mut options_started = false;
        let mut iter = tokens.iter();

        while let Some(token) = iter.next() {
            let word = match token {
                RequestToken::Word(word) => word,
                RequestToken::List(_) => {
                    return Err(malformed("list value without a preceding key"));
                }
            };

            if word == EXCLUDE_KEY {
                options_started = true;
                match iter.next() {
                    Some(RequestToken::List(entries)) => {
                        request.exclusions.extend(parse_exclusions(entries)?);
                    }
                    _ => {
                        return Err(malformed(&format!(
                            "{} must be followed by a list",
                            EXCLUDE_KEY
                        )))
                    }
                }
            } else if is_custom_key(word) {
                options_started = true;
                let value = match iter.next() {
                    Some(RequestToken::Word(value)) => ArgValue::Word(value.clone()),
                    Some(RequestToken::List(items)) => ArgValue::List(list_words(items, word)?),
                    None => return Err(malformed(&format!("missing value for '{}'", word))),
                };
                request.extra_args.insert(word.clone(), value);
            } else if word.starts_with(RESERVED_PREFIX) {
                return Err(malformed(&format!("unrecognized reserved key '{}'", word)));
            } else if options_started {
                return Err(malformed(&format!(
                    "bundle '{}' must precede {} and custom arguments",
                    word, EXCLUDE_KEY
                )));
            } else if word.is_empty() {
                return Err(malformed("empty bundle name"));
            } else {
                request.bundle_names.push(word.clone());
            }
        }

        Ok(request)
    }

    /// Check the structural invariants `parse` guarantees, for requests built in code.
    pub fn validate(&self) -> Result<(), ResolveError> {
        for name in &self.bundle_names {
            if name.is_empty() {
                return Err(malformed("empty bundle name"));
            }
            if name.starts_with(RESERVED_PREFIX) {
                return Err(malformed(&format!(
                    "'{}' is an option, not a bundle name; bundles must precede options",
                    name
                )));
            }
        }
        for exclusion in &self.exclusions {
            if exclusion.target.is_empty() {
                return Err(malformed("exclusion with empty target"));
            }
        }
        for key in self.extra_args.keys() {
            if !is_custom_key(key) {
                return Err(malformed(&format!(
                    "custom argument '{}' must use the '{}' prefix",
                    key, CUSTOM_PREFIX
                )));
            }
        }
        Ok(())
    }
}

fn is_custom_key(word: &str) -> bool {
    word.len() > CUSTOM_PREFIX.len() && word.starts_with(CUSTOM_PREFIX)
}

fn malformed(message: &str) -> ResolveError {
    ResolveError::MalformedRequest(message.to_string())
}

fn list_words(items: &[RequestToken], context: &str) -> Result<Vec<String>, ResolveError> {
    items
        .iter()
        .map(|item| match item {
            RequestToken::Word(word) => Ok(word.clone()),
            RequestToken::List(_) => Err(malformed(&format!("nested list under '{}'", context))),
        })
        .collect()
}

fn parse_exclusions(entries: &[RequestToken]) -> Result<Vec<Exclusion>, ResolveError> {
    let mut exclusions = Vec::new();
    let mut iter = entries.iter().peekable();

    while let Some(entry) = iter.next() {
        let target = match entry {
            RequestToken::Word(target) if !target.is_empty() => target,
            RequestToken::Word(_) => return Err(malformed("exclusion with empty target")),
            RequestToken::List(_) => {
                return Err(malformed("exclusion sub-items without a target"));
            }
        };

        if let Some(RequestToken::List(items)) = iter.peek() {
            let sub_items = list_words(items, target)?;
            iter.next();
            exclusions.push(Exclusion::items(target.clone(), sub_items));
        } else {
            exclusions.push(Exclusion::whole(target.clone()));
        }
    }

    Ok(exclusions)
}
