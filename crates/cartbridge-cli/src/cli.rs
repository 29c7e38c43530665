//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use cartbridge_core::{DataCategory, MigrationStatus};
use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Cartbridge CLI - Shopware to Shopify field mapping and migration tooling
///
/// Runs stored field-mapping rule sets over local documents, checks rule sets
/// before they are deployed, and simulates webhook ingestion end to end.
#[derive(Parser, Debug)]
#[command(
    name = "cartbridge",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "CARTBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a rule set over a source document
    Transform(TransformArgs),

    /// Check every rule of a rule set without running it
    Validate(ValidateArgs),

    /// Print a built-in rule set
    Defaults(DefaultsArgs),

    /// Simulate webhook ingestion against in-memory collaborators
    Ingest(IngestArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the transform command
#[derive(Parser, Debug)]
pub struct TransformArgs {
    /// Source document (JSON or YAML)
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Rule set file: a list of field mappings or a dataflow
    #[arg(short, long, value_name = "FILE")]
    pub mappings: PathBuf,

    /// Entity lookup tables (overrides mapping.lookup_file)
    #[arg(short, long, value_name = "FILE")]
    pub lookup: Option<PathBuf>,

    /// Print the partial document when the run aborts
    #[arg(long)]
    pub show_partial: bool,

    /// Write the destination document to a file
    #[arg(long = "save-to", value_name = "FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Rule set file: a list of field mappings or a dataflow
    #[arg(value_name = "MAPPINGS")]
    pub mappings: PathBuf,
}

/// Arguments for the defaults command
#[derive(Parser, Debug)]
pub struct DefaultsArgs {
    /// Data category of the rule set
    #[arg(value_enum)]
    pub category: CategoryArg,

    /// Tag every rule with this dataflow id
    #[arg(long)]
    pub dataflow_id: Option<u64>,
}

/// Arguments for the ingest command
#[derive(Parser, Debug)]
pub struct IngestArgs {
    /// Webhook event file (JSON or YAML)
    #[arg(value_name = "WEBHOOK")]
    pub webhook: PathBuf,

    /// Catalog file with connectors and dataflows
    #[arg(short, long, value_name = "FILE")]
    pub dataflows: PathBuf,

    /// Source document fetched for the event
    #[arg(long, value_name = "FILE")]
    pub document: PathBuf,

    /// Entity lookup tables used by the transformation run
    #[arg(short, long, value_name = "FILE")]
    pub lookup: Option<PathBuf>,

    /// Run each handed-off dataflow's rule set after ingestion
    #[arg(long)]
    pub transform: bool,

    /// Finish each in-progress log with a simulated orchestrator callback
    #[arg(long, value_enum, value_name = "STATUS")]
    pub callback: Option<CallbackStatus>,

    /// Redact credentials and source payloads in the printed logs
    #[arg(long)]
    pub redact: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),

    /// Print the configuration file in use
    Path,
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Target file (defaults to .cartbridge.toml in the current directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Force overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    Product,
    Order,
}

/// Terminal status reported by a simulated callback
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CallbackStatus {
    Success,
    Failed,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl From<CategoryArg> for DataCategory {
    fn from(category: CategoryArg) -> Self {
        match category {
            CategoryArg::Product => DataCategory::Product,
            CategoryArg::Order => DataCategory::Order,
        }
    }
}

impl From<CallbackStatus> for MigrationStatus {
    fn from(status: CallbackStatus) -> Self {
        match status {
            CallbackStatus::Success => MigrationStatus::Success,
            CallbackStatus::Failed => MigrationStatus::Failed,
        }
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
