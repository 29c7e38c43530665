//! Shared utilities for command handlers

use crate::config::FileFormat;
use crate::error::{Error, Result};
use cartbridge_core::{Dataflow, FieldMapping, InMemoryEntityLookup};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read a JSON, YAML or TOML file into `T`
pub fn read_structured<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    debug!(file = %path.display(), bytes = content.len(), "Read input file");

    let format = FileFormat::from_path(path);
    let invalid = |expected: &str| Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: expected.to_string(),
    };

    match format {
        FileFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| invalid(&format!("YAML ({})", e))),
        FileFormat::Toml => toml::from_str(&content).map_err(|e| invalid(&format!("TOML ({})", e))),
        FileFormat::Json => serde_json::from_str(&content).map_err(|e| invalid(&format!("JSON ({})", e))),
    }
}

/// A rule-set file: a bare list of field mappings or a whole dataflow
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleSetFile {
    Rules(Vec<FieldMapping>),
    Dataflow(Box<Dataflow>),
    Wrapped { field_mappings: Vec<FieldMapping> },
}

/// Load the ordered rules of a rule-set file
pub fn load_rules(path: &Path) -> Result<Vec<FieldMapping>> {
    let rules = match read_structured::<RuleSetFile>(path)? {
        RuleSetFile::Rules(rules) => rules,
        RuleSetFile::Dataflow(dataflow) => dataflow.field_mappings,
        RuleSetFile::Wrapped { field_mappings } => field_mappings,
    };
    debug!(rules = rules.len(), "Loaded rule set");
    Ok(rules)
}

/// Load entity lookup tables from `explicit`, else from the configured file
pub fn load_lookup(
    explicit: Option<&Path>,
    configured: Option<&Path>,
) -> Result<Option<InMemoryEntityLookup>> {
    match explicit.or(configured) {
        Some(path) => {
            let lookup: InMemoryEntityLookup = read_structured(path)?;
            debug!(
                entries = lookup.len(),
                entity_types = ?lookup.entity_types().collect::<Vec<_>>(),
                "Loaded entity lookup tables"
            );
            Ok(Some(lookup))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartbridge_core::TransformType;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_load_rules_from_list_and_dataflow() {
        let dir = TempDir::new().unwrap();

        let list = dir.path().join("rules.json");
        fs::write(
            &list,
            r#"[{"source_field": "name", "dest_field": "title"},
                {"source_field": "stock", "dest_field": "qty", "transform_type": "convert",
                 "transform_config": "{\"type\": \"int\"}"}]"#,
        )
        .unwrap();
        let rules = load_rules(&list).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].transform_type, TransformType::Convert);

        let flow = dir.path().join("flow.yaml");
        fs::write(
            &flow,
            "id: 3\nname: Products\ntype: product\nsource_connector_id: 1\ndest_connector_id: 2\nfield_mappings:\n  - source_field: name\n    dest_field: title\n",
        )
        .unwrap();
        assert_eq!(load_rules(&flow).unwrap()[0].dest_field, "title");

        let wrapped = dir.path().join("wrapped.toml");
        fs::write(
            &wrapped,
            "[[field_mappings]]\nsource_field = \"name\"\ndest_field = \"title\"\nis_required = true\n",
        )
        .unwrap();
        assert!(load_rules(&wrapped).unwrap()[0].is_required);
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(load_rules(&missing), Err(Error::FileNotFound { .. })));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{not json").unwrap();
        assert!(matches!(load_rules(&broken), Err(Error::InvalidFormat { .. })));
    }

    #[test]
    fn test_explicit_lookup_wins() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("lookup.json");
        fs::write(&explicit, r#"{"manufacturer": {"m-1": {"name": "Acme"}}}"#).unwrap();

        let configured = PathBuf::from("does-not-exist.json");
        let lookup = load_lookup(Some(&explicit), Some(&configured)).unwrap().unwrap();
        assert_eq!(lookup.len(), 1);

        assert!(load_lookup(None, None).unwrap().is_none());
    }
}
