//! Nested path accessor for schema-less documents
//!
//! Paths are dot-separated segments where a segment may carry one bracketed,
//! non-negative index: `variants[0].price`. Reads fail with distinct
//! [`MappingError`] kinds that the pipeline treats as "not found"; writes
//! materialize missing containers and fail on a shape conflict, or with
//! `InvalidPath` when an index would grow a sequence past
//! [`MAX_SEQUENCE_GROWTH`].
//!
//! Copyright (c) 2025 Cartbridge Team
//! Licensed under the Apache-2.0 license

use super::types::MappingError;
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Most placeholder elements a single write may append to a sequence
pub const MAX_SEQUENCE_GROWTH: usize = 10_000;

static INDEXED_SEGMENT: OnceLock<Regex> = OnceLock::new();

fn indexed_segment_regex() -> &'static Regex {
    INDEXED_SEGMENT.get_or_init(|| {
        Regex::new(r"^([^\[\]]+)\[([^\[\]]*)\]$").expect("indexed segment pattern is valid")
    })
}

/// A single step of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `name` - descend into an object key
    Key(String),
    /// `name[3]` - descend into an object key holding a sequence, then an element
    Indexed { key: String, index: usize },
}

impl Segment {
    pub fn key(&self) -> &str {
        match self {
            Segment::Key(key) | Segment::Indexed { key, .. } => key,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{}", key),
            Segment::Indexed { key, index } => write!(f, "{}[{}]", key, index),
        }
    }
}

/// A parsed path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parse a path expression such as `variants[0].price`
    pub fn parse(path: &str) -> Result<Self, MappingError> {
        let invalid = |reason: String| MappingError::InvalidPath {
            path: path.to_string(),
            reason,
        };

        if path.is_empty() {
            return Err(invalid("path is empty".to_string()));
        }

        let mut segments = Vec::new();
        for part in path.split('.') {
            if part.is_empty() {
                return Err(invalid("empty segment".to_string()));
            }

            if !part.contains('[') && !part.contains(']') {
                segments.push(Segment::Key(part.to_string()));
                continue;
            }

            let captures = indexed_segment_regex()
                .captures(part)
                .ok_or_else(|| invalid(format!("malformed segment '{}'", part)))?;
            let index = captures[2]
                .parse::<usize>()
                .map_err(|_| invalid(format!("invalid array index '{}'", &captures[2])))?;
            segments.push(Segment::Indexed {
                key: captures[1].to_string(),
                index,
            });
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Resolve this path inside `tree`
    pub fn get<'a>(&self, tree: &'a Value) -> Result<&'a Value, MappingError> {
        self.walk(tree, &self.segments)
    }

    /// Resolve the final segment's parent strictly, then the leaf leniently
    ///
    /// `Ok(None)` means the parent is an object that lacks the leaf. A missing
    /// or non-object parent is still an error.
    pub fn get_leaf<'a>(&self, tree: &'a Value) -> Result<Option<&'a Value>, MappingError> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Ok(Some(tree));
        };

        let parent = self.walk(tree, parents)?;
        if !parent.is_object() {
            return Err(self.not_found(last));
        }
        Ok(self.walk(parent, std::slice::from_ref(last)).ok())
    }

    fn walk<'a>(&self, tree: &'a Value, segments: &[Segment]) -> Result<&'a Value, MappingError> {
        let mut current = tree;

        for segment in segments {
            let object = current.as_object().ok_or_else(|| self.not_found(segment))?;
            let child = object.get(segment.key()).ok_or_else(|| self.not_found(segment))?;

            current = match segment {
                Segment::Key(_) => child,
                Segment::Indexed { index, .. } => {
                    let items = child.as_array().ok_or_else(|| self.not_found(segment))?;
                    items.get(*index).ok_or_else(|| MappingError::IndexOutOfBounds {
                        path: self.raw.clone(),
                        index: *index,
                        len: items.len(),
                    })?
                }
            };
        }

        Ok(current)
    }

    /// Assign `value` at this path, creating intermediate containers
    pub fn set(&self, tree: &mut Value, value: Value) -> Result<(), MappingError> {
        let (last, parents) = match self.segments.split_last() {
            Some(split) => split,
            None => return Ok(()),
        };

        let mut current = tree;
        for segment in parents {
            let object = self.expect_object(current, segment)?;
            current = match segment {
                Segment::Key(key) => {
                    let child = object.entry(key.clone()).or_insert(Value::Null);
                    if child.is_null() {
                        *child = Value::Object(Map::new());
                    }
                    child
                }
                Segment::Indexed { key, index } => {
                    let slot = self.grown_slot(object, key, *index, segment)?;
                    if slot.is_null() {
                        *slot = Value::Object(Map::new());
                    }
                    slot
                }
            };
        }

        let object = self.expect_object(current, last)?;
        match last {
            Segment::Key(key) => {
                object.insert(key.clone(), value);
            }
            Segment::Indexed { key, index } => {
                *self.grown_slot(object, key, *index, last)? = value;
            }
        }
        Ok(())
    }

    /// Element `index` of the sequence under `key`, growing it as needed
    fn grown_slot<'a>(
        &self,
        object: &'a mut Map<String, Value>,
        key: &str,
        index: usize,
        segment: &Segment,
    ) -> Result<&'a mut Value, MappingError> {
        let entry = object.entry(key.to_string()).or_insert(Value::Null);
        if entry.is_null() {
            *entry = Value::Array(Vec::new());
        }

        let found = shape_name(entry);
        let items = entry.as_array_mut().ok_or_else(|| MappingError::ShapeConflict {
            path: self.raw.clone(),
            segment: segment.to_string(),
            expected: "array".to_string(),
            found: found.to_string(),
        })?;

        if items.len() <= index {
            let len = index
                .checked_add(1)
                .filter(|len| *len - items.len() <= MAX_SEQUENCE_GROWTH)
                .ok_or_else(|| MappingError::InvalidPath {
                    path: self.raw.clone(),
                    reason: format!(
                        "index {} would grow '{}' by more than {} elements",
                        index, key, MAX_SEQUENCE_GROWTH
                    ),
                })?;
            items.resize_with(len, || Value::Object(Map::new()));
        }
        let len = items.len();
        items.get_mut(index).ok_or_else(|| MappingError::IndexOutOfBounds {
            path: self.raw.clone(),
            index,
            len,
        })
    }

    fn expect_object<'a>(
        &self,
        value: &'a mut Value,
        segment: &Segment,
    ) -> Result<&'a mut Map<String, Value>, MappingError> {
        let found = shape_name(value);
        value.as_object_mut().ok_or_else(|| MappingError::ShapeConflict {
            path: self.raw.clone(),
            segment: segment.to_string(),
            expected: "object".to_string(),
            found: found.to_string(),
        })
    }

    fn not_found(&self, segment: &Segment) -> MappingError {
        MappingError::PathNotFound {
            path: self.raw.clone(),
            segment: segment.key().to_string(),
        }
    }
}

impl FromStr for FieldPath {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resolve `path` inside `tree`
pub fn get<'a>(tree: &'a Value, path: &str) -> Result<&'a Value, MappingError> {
    FieldPath::parse(path)?.get(tree)
}

/// Resolve `path` inside `tree`, folding every failure into `None`
pub fn lookup<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    get(tree, path).ok()
}

/// Assign `value` at `path` inside `tree`
pub fn set(tree: &mut Value, path: &str, value: Value) -> Result<(), MappingError> {
    FieldPath::parse(path)?.set(tree, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_segments() {
        let path = FieldPath::parse("variants[0].price").unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Indexed {
                    key: "variants".to_string(),
                    index: 0
                },
                Segment::Key("price".to_string()),
            ]
        );
        assert_eq!(path.to_string(), "variants[0].price");
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        for bad in ["", "a..b", "a.", "[0]", "a[x]", "a[-1]", "a[0", "a]0[", "a[0]b", "a[]"] {
            let err = FieldPath::parse(bad).unwrap_err();
            assert_eq!(err.kind(), "invalid_path", "path {:?}", bad);
        }
    }

    #[test]
    fn test_get_nested_value() {
        let doc = json!({"variants": [{"price": "9.99"}]});
        assert_eq!(get(&doc, "variants[0].price").unwrap(), &json!("9.99"));
    }

    #[test]
    fn test_get_missing_key() {
        let doc = json!({"seo": {"title": "Foo"}});
        let err = get(&doc, "seo.description").unwrap_err();
        assert!(matches!(
            err,
            MappingError::PathNotFound { ref segment, .. } if segment == "description"
        ));
    }

    #[test]
    fn test_get_index_out_of_bounds() {
        let doc = json!({"price": [{"gross": 10}]});
        let err = get(&doc, "price[3].gross").unwrap_err();
        assert_eq!(
            err,
            MappingError::IndexOutOfBounds {
                path: "price[3].gross".to_string(),
                index: 3,
                len: 1
            }
        );
    }

    #[test]
    fn test_get_through_scalar_is_not_found() {
        let doc = json!({"name": "Shirt", "tags": "summer"});
        assert_eq!(get(&doc, "name.first").unwrap_err().kind(), "path_not_found");
        assert_eq!(get(&doc, "tags[0]").unwrap_err().kind(), "path_not_found");
    }

    #[test]
    fn test_get_returns_explicit_null() {
        let doc = json!({"description": null});
        assert_eq!(get(&doc, "description").unwrap(), &Value::Null);
    }

    #[test]
    fn test_get_leaf_separates_leaf_and_parent_misses() {
        let doc = json!({"seo": {"title": "Foo"}, "name": "Shirt"});
        assert_eq!(
            FieldPath::parse("seo.title").unwrap().get_leaf(&doc).unwrap(),
            Some(&json!("Foo"))
        );
        assert_eq!(FieldPath::parse("seo.handle").unwrap().get_leaf(&doc).unwrap(), None);
        assert_eq!(FieldPath::parse("seo.tags[0]").unwrap().get_leaf(&doc).unwrap(), None);
        assert!(FieldPath::parse("meta.title").unwrap().get_leaf(&doc).is_err());
        assert!(FieldPath::parse("name.first").unwrap().get_leaf(&doc).is_err());
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut doc = json!({});
        set(&mut doc, "seo.title", json!("Foo")).unwrap();
        assert_eq!(doc, json!({"seo": {"title": "Foo"}}));
    }

    #[test]
    fn test_set_grows_arrays_with_object_placeholders() {
        let mut doc = json!({});
        set(&mut doc, "variants[2].sku", json!("SKU-1")).unwrap();
        assert_eq!(doc, json!({"variants": [{}, {}, {"sku": "SKU-1"}]}));

        set(&mut doc, "variants[0].price", json!("9.99")).unwrap();
        assert_eq!(doc["variants"][0], json!({"price": "9.99"}));
        assert_eq!(doc["variants"][2], json!({"sku": "SKU-1"}));
    }

    #[test]
    fn test_set_indexed_leaf() {
        let mut doc = json!({});
        set(&mut doc, "metafields[1]", json!({"key": "height"})).unwrap();
        assert_eq!(doc, json!({"metafields": [{}, {"key": "height"}]}));
    }

    #[test]
    fn test_set_overwrites_leaf() {
        let mut doc = json!({"title": "Old"});
        set(&mut doc, "title", json!("New")).unwrap();
        assert_eq!(doc, json!({"title": "New"}));
    }

    #[test]
    fn test_set_replaces_null_intermediate() {
        let mut doc = json!({"seo": null});
        set(&mut doc, "seo.title", json!("Foo")).unwrap();
        assert_eq!(doc, json!({"seo": {"title": "Foo"}}));
    }

    #[test]
    fn test_set_shape_conflict_on_scalar_intermediate() {
        let mut doc = json!({"seo": "not an object"});
        let err = set(&mut doc, "seo.title", json!("Foo")).unwrap_err();
        assert!(matches!(
            err,
            MappingError::ShapeConflict { ref expected, ref found, .. }
                if expected == "object" && found == "string"
        ));
        assert_eq!(doc, json!({"seo": "not an object"}));
    }

    #[test]
    fn test_set_shape_conflict_on_non_array() {
        let mut doc = json!({"variants": {"sku": "A"}});
        let err = set(&mut doc, "variants[0].sku", json!("B")).unwrap_err();
        assert_eq!(err.kind(), "shape_conflict");
    }

    #[test]
    fn test_set_shape_conflict_on_scalar_element() {
        let mut doc = json!({"variants": ["flat"]});
        let err = set(&mut doc, "variants[0].sku", json!("B")).unwrap_err();
        assert_eq!(err.kind(), "shape_conflict");
    }

    #[test]
    fn test_set_invalid_path_is_error() {
        let mut doc = json!({});
        assert_eq!(set(&mut doc, "a[", json!(1)).unwrap_err().kind(), "invalid_path");
    }

    #[test]
    fn test_set_rejects_unbounded_index() {
        let mut doc = json!({"title": "Shirt"});
        let err = set(&mut doc, "variants[18446744073709551615].sku", json!("x")).unwrap_err();
        assert_eq!(err.kind(), "invalid_path");

        let err = set(&mut doc, "variants[100000000000]", json!("x")).unwrap_err();
        assert_eq!(err.kind(), "invalid_path");
        // Nothing was grown by the refused writes
        assert_eq!(doc, json!({"title": "Shirt", "variants": []}));

        let edge = format!("variants[{}]", MAX_SEQUENCE_GROWTH - 1);
        set(&mut doc, &edge, json!("last")).unwrap();
        assert_eq!(doc["variants"].as_array().unwrap().len(), MAX_SEQUENCE_GROWTH);
    }

    #[test]
    fn test_lookup_folds_errors() {
        let doc = json!({"a": 1});
        assert_eq!(lookup(&doc, "a"), Some(&json!(1)));
        assert_eq!(lookup(&doc, "b"), None);
        assert_eq!(lookup(&doc, "a[0"), None);
    }
}
