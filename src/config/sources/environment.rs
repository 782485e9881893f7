//! Environment source: PREAMBLE_<SECTION>__<KEY>, e.g. PREAMBLE_EXECUTION__MAX_EXPANSION_DEPTH=8.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

/// Add environment overrides to builder. Highest precedence.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("PREAMBLE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
