//! CLI domain: parse, route, output, and presentation only.
//! No engine logic; a single route table dispatches to the resolver and executor.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, RequestArgs};
pub use route::{builtin_generators, RunContext, REQUEST_ARGS_GENERATOR};
