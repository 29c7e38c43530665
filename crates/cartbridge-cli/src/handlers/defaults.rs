//! Defaults command handler

use crate::cli::DefaultsArgs;
use crate::error::Result;
use crate::output::OutputWriter;
use cartbridge_core::mapping::built_in;
use cartbridge_core::DataCategory;
use tracing::{debug, instrument};

/// Handle the defaults command
#[instrument(skip(output))]
pub async fn handle_defaults(args: DefaultsArgs, output: &mut OutputWriter) -> Result<()> {
    let category = DataCategory::from(args.category);
    let rules = built_in::default_mappings(category, args.dataflow_id);
    debug!(%category, rules = rules.len(), "Printing built-in rule set");

    output.data(&rules)
}
