//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod config;
mod defaults;
mod ingest;
mod transform;
mod utils;
mod validate;

pub use completions::handle_completions;
pub use config::handle_config;
pub use defaults::handle_defaults;
pub use ingest::handle_ingest;
pub use transform::handle_transform;
pub use validate::handle_validate;
