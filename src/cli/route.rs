//! CLI route: single route table and run context. Dispatches to the engine and presentation.

use crate::capability::RecordingCapability;
use crate::cli::parse::{Commands, RequestArgs};
use crate::cli::presentation::{
    format_apply_json, format_apply_text, format_bundles_json, format_bundles_text,
    format_plan_json, format_plan_text, ProviderSummary,
};
use crate::config::{ConfigLoader, PreambleConfig};
use crate::context::Context;
use crate::definition::{DefinitionSet, GeneratorRegistry};
use crate::directive::Directive;
use crate::error::{ApiError, ResolveError};
use crate::executor::Executor;
use crate::request::{Request, RequestToken, CUSTOM_PREFIX, EXCLUDE_KEY};
use crate::runtime::RuntimeApplier;
use crate::types::ArgValue;
use std::path::PathBuf;
use tracing::{debug, info};

/// Generator name available to every definition file loaded by the CLI.
pub const REQUEST_ARGS_GENERATOR: &str = "request-args";

/// Runtime context for CLI execution: loaded configuration and definitions.
pub struct RunContext {
    config: PreambleConfig,
    definitions: DefinitionSet,
}

impl RunContext {
    /// Create run context from workspace root, optional config path, and
    /// definition files given on the command line (which replace the configured ones).
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        definitions: Vec<PathBuf>,
    ) -> Result<Self, ApiError> {
        let mut config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        if !definitions.is_empty() {
            config.definitions = definitions;
        }
        config.ensure_valid()?;

        if config.definitions.is_empty() {
            return Err(ApiError::ConfigError(
                "No definition files configured; pass --definitions PATH".to_string(),
            ));
        }

        let definitions = DefinitionSet::load_all(&config.definitions, &builtin_generators())?;
        info!(
            files = config.definitions.len(),
            providers = definitions.provider_names().len(),
            "Definitions loaded"
        );
        Ok(Self {
            config,
            definitions,
        })
    }

    pub fn config(&self) -> &PreambleConfig {
        &self.config
    }

    pub fn definitions(&self) -> &DefinitionSet {
        &self.definitions
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Bundles { provider, format } => {
                self.handle_bundles(provider.as_deref(), format)
            }
            Commands::Plan(args) => self.handle_plan(args),
            Commands::Apply(args) => self.handle_apply(args),
        }
    }

    fn handle_bundles(&self, provider: Option<&str>, format: &str) -> Result<String, ApiError> {
        let names = match provider {
            Some(name) => vec![name.to_string()],
            None => self.definitions.provider_names(),
        };
        let mut summaries = Vec::with_capacity(names.len());
        for name in names {
            let provider = self.definitions.provider(&name)?;
            summaries.push(ProviderSummary {
                name,
                bundles: provider.bundle_names(),
            });
        }

        if format == "json" {
            format_bundles_json(&summaries)
        } else {
            Ok(format_bundles_text(&summaries))
        }
    }

    fn handle_plan(&self, args: &RequestArgs) -> Result<String, ApiError> {
        let applier = self.applier(&args.provider)?;
        let request = build_request(args)?;
        let resolution = applier.plan(&request)?;
        debug!(provider = %args.provider, directives = resolution.len(), "Planned request");

        if args.format == "json" {
            format_plan_json(&resolution)
        } else {
            Ok(format_plan_text(&resolution))
        }
    }

    fn handle_apply(&self, args: &RequestArgs) -> Result<String, ApiError> {
        let applier = self.applier(&args.provider)?;
        let request = build_request(args)?;
        let capability: RecordingCapability = self.definitions.recording_capability();
        let mut context = Context::new(self.config.execution.context_name.clone());
        let report = match applier.apply_request(&request, &capability, &mut context) {
            Ok(report) => report,
            Err(ApiError::Execution(source)) => {
                return Err(ApiError::PartialApply {
                    source,
                    journal: context.journal().to_vec(),
                })
            }
            Err(err) => return Err(err),
        };

        if args.format == "json" {
            format_apply_json(&report, &context)
        } else {
            Ok(format_apply_text(&report, &context))
        }
    }

    fn applier(&self, provider: &str) -> Result<RuntimeApplier, ApiError> {
        let provider = self.definitions.provider(provider)?;
        Ok(RuntimeApplier::with_executor(
            provider,
            Executor::from_config(&self.config.execution),
        ))
    }
}

/// Generators the CLI registers for definition files.
///
/// `&request-args` enables one target per custom argument: `--feature=a,b`
/// becomes `feature` with args `[a, b]`.
pub fn builtin_generators() -> GeneratorRegistry {
    GeneratorRegistry::new().register(REQUEST_ARGS_GENERATOR, |input| {
        Ok(input
            .extra_args
            .iter()
            .map(|(key, value)| {
                let target = key.trim_start_matches(CUSTOM_PREFIX);
                let args = match value {
                    ArgValue::Word(word) => vec![word.clone()],
                    ArgValue::List(items) => items.clone(),
                };
                Directive::enable(target).with_args(args)
            })
            .collect())
    })
}

/// Translate command-line request arguments into a request token stream and parse it.
fn build_request(args: &RequestArgs) -> Result<Request, ApiError> {
    Ok(Request::parse(&request_tokens(args)?)?)
}

fn request_tokens(args: &RequestArgs) -> Result<Vec<RequestToken>, ResolveError> {
    let mut tokens: Vec<RequestToken> = args.bundles.iter().map(RequestToken::word).collect();

    if !args.exclude.is_empty() {
        let mut entries = Vec::new();
        for spec in &args.exclude {
            match spec.split_once('=') {
                Some((target, items)) => {
                    entries.push(RequestToken::word(target));
                    entries.push(RequestToken::words(split_list(items)));
                }
                None => entries.push(RequestToken::word(spec.as_str())),
            }
        }
        tokens.push(RequestToken::word(EXCLUDE_KEY));
        tokens.push(RequestToken::list(entries));
    }

    for spec in &args.args {
        let (key, value) = spec.split_once('=').ok_or_else(|| {
            ResolveError::MalformedRequest(format!("argument '{}' is not KEY=VALUE", spec))
        })?;
        let key = key.trim_start_matches(CUSTOM_PREFIX);
        tokens.push(RequestToken::word(format!("{}{}", CUSTOM_PREFIX, key)));
        if value.contains(',') {
            tokens.push(RequestToken::words(split_list(value)));
        } else {
            tokens.push(RequestToken::word(value));
        }
    }

    Ok(tokens)
}

fn split_list(items: &str) -> Vec<String> {
    items
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
