//! Transform command handler

use super::utils::{load_lookup, load_rules, read_structured};
use crate::cli::TransformArgs;
use crate::config::{Config, FileFormat};
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use cartbridge_core::{EntityLookup, MappingPipeline};
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Handle the transform command
#[instrument(skip(config, output), fields(source = %args.source.display(), mappings = %args.mappings.display()))]
pub async fn handle_transform(
    args: TransformArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("transform", &args.source.display().to_string());

    let rules = load_rules(&args.mappings)?;
    let source: Value = read_structured(&args.source)?;
    let lookup = load_lookup(args.lookup.as_deref(), config.mapping.lookup_file.as_deref())?;

    let mut pipeline = MappingPipeline::new(rules).with_defaults(config.dispatch_defaults());
    if let Some(lookup) = lookup {
        let lookup: Arc<dyn EntityLookup> = Arc::new(lookup);
        pipeline = pipeline.with_lookup(lookup);
    }
    info!(rules = pipeline.rule_count(), "Running rule set");

    let spinner = output.spinner("Transforming document...");
    let outcome = pipeline.transform(&source);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    debug!(applied = outcome.applied, skipped = outcome.skipped, "Transformation finished");
    output.outcome(&outcome, args.show_partial)?;

    match outcome.failure {
        None => {
            if let Some(path) = &args.save_to {
                save_document(&outcome.document, path)?;
                output.success(&format!("Saved destination document to {}", path.display()))?;
            }
            Ok(())
        }
        Some(failure) => {
            warn!(rule_index = failure.rule_index, "Transformation aborted");
            Err(Error::Core(failure.into()))
        }
    }
}

fn save_document(document: &Value, path: &std::path::Path) -> Result<()> {
    let content = match FileFormat::from_path(path) {
        FileFormat::Yaml => serde_yaml::to_string(document)?,
        FileFormat::Toml => toml::to_string_pretty(document)
            .map_err(|e| Error::other(format!("Failed to serialize as TOML: {}", e)))?,
        FileFormat::Json => serde_json::to_string_pretty(document)?,
    };
    fs::write(path, content)?;
    Ok(())
}
