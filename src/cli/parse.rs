//! CLI parse: clap types for Preamble. No behavior; definitions only.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Preamble CLI - resolve and apply directive bundles
#[derive(Parser)]
#[command(name = "preamble")]
#[command(about = "Resolve declarative directive bundles into ordered action sequences")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Definition file to load; repeatable, replaces `definitions` from config
    #[arg(long = "definitions", value_name = "PATH")]
    pub definitions: Vec<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List providers and their bundles
    Bundles {
        /// Only show this provider
        #[arg(long)]
        provider: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the resolved directive sequence without executing it
    Plan(RequestArgs),
    /// Resolve and execute against a recording capability
    Apply(RequestArgs),
}

/// Request shared by `plan` and `apply`.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Provider to resolve against
    #[arg(long)]
    pub provider: String,

    /// Bundles to enable, in order
    #[arg(value_name = "BUNDLE")]
    pub bundles: Vec<String>,

    /// Exclude a target (`T`) or some of its items (`T=a,b`); repeatable
    #[arg(long = "exclude", value_name = "TARGET[=ITEMS]")]
    pub exclude: Vec<String>,

    /// Custom argument passed to dynamic providers and generators (`KEY=VALUE`, `KEY=a,b`); repeatable
    #[arg(long = "arg", value_name = "KEY=VALUE")]
    pub args: Vec<String>,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: String,
}
