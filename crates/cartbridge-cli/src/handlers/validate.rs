//! Validate command handler

use super::utils::load_rules;
use crate::cli::ValidateArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use cartbridge_core::MappingPipeline;
use tracing::{info, instrument, warn};

/// Handle the validate command
///
/// Every rule's transformation config is checked up front, without running
/// the rule set, so problems that would only surface on the first matching
/// record are reported before deployment.
#[instrument(skip(config, output), fields(file = %args.mappings.display()))]
pub async fn handle_validate(
    args: ValidateArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("validate", &args.mappings.display().to_string());

    let pipeline = MappingPipeline::new(load_rules(&args.mappings)?)
        .with_defaults(config.dispatch_defaults());
    let problems = pipeline.validate_rules();

    output.rule_problems(pipeline.rule_count(), &problems)?;

    if problems.is_empty() {
        info!(rules = pipeline.rule_count(), "Rule set is valid");
        Ok(())
    } else {
        for problem in &problems {
            warn!(rule_index = problem.rule_index, error = %problem.error, "Invalid rule");
        }
        Err(Error::InvalidRules {
            count: problems.len(),
        })
    }
}
