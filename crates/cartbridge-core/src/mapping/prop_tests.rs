//! Property-based tests for the path accessor and identifier encoding
//!
//! These tests verify that writes through a path are always readable back
//! through the same path, and that global ids round-trip.

#[cfg(test)]
mod tests {
    use crate::mapping::path::{self, FieldPath};
    use crate::mapping::{TransformDispatcher, TransformType};
    use crate::types::FieldMapping;
    use proptest::prelude::*;
    use serde_json::{json, Map, Value};

    /// Strategy for scalar leaf values
    fn leaf_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| Value::Number(n.into())),
            "[a-zA-Z0-9 ]{0,30}".prop_map(Value::String),
        ]
    }

    /// Strategy for path segments, optionally indexed
    fn segment_strategy() -> impl Strategy<Value = String> {
        (
            "[a-zA-Z_][a-zA-Z0-9_]{0,10}",
            proptest::option::of(0usize..5),
        )
            .prop_map(|(key, index)| match index {
                Some(index) => format!("{}[{}]", key, index),
                None => key,
            })
    }

    /// Strategy for dot-separated paths of one to four segments
    fn path_strategy() -> impl Strategy<Value = String> {
        proptest::collection::vec(segment_strategy(), 1..5).prop_map(|segments| segments.join("."))
    }

    /// Object keys that path segments can never produce
    fn sibling_key_strategy() -> impl Strategy<Value = String> {
        "\\$[a-z]{1,6}"
    }

    /// Arbitrary nested documents built from sibling keys
    fn tree_strategy() -> impl Strategy<Value = Value> {
        leaf_strategy().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                proptest::collection::btree_map(sibling_key_strategy(), inner, 0..4)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    /// Root objects whose keys stay clear of every generated path
    fn root_strategy() -> impl Strategy<Value = Map<String, Value>> {
        proptest::collection::btree_map(sibling_key_strategy(), tree_strategy(), 0..5)
            .prop_map(|map| map.into_iter().collect())
    }

    proptest! {
        #[test]
        fn set_then_get_returns_value(path in path_strategy(), value in leaf_strategy()) {
            let mut tree = json!({});
            path::set(&mut tree, &path, value.clone()).unwrap();
            prop_assert_eq!(path::get(&tree, &path).unwrap(), &value);
        }

        #[test]
        fn set_then_get_on_populated_tree(
            root in root_strategy(),
            path in path_strategy(),
            value in leaf_strategy(),
        ) {
            let mut tree = Value::Object(root.clone());
            path::set(&mut tree, &path, value.clone()).unwrap();
            prop_assert_eq!(path::get(&tree, &path).unwrap(), &value);

            for (key, sibling) in &root {
                prop_assert_eq!(&tree[key.as_str()], sibling);
            }
        }

        #[test]
        fn set_grows_existing_sequence_and_keeps_elements(
            existing in proptest::collection::vec(
                proptest::collection::btree_map(sibling_key_strategy(), leaf_strategy(), 0..3),
                0..5,
            ),
            index in 0usize..8,
            value in leaf_strategy(),
        ) {
            let elements: Vec<Value> = existing
                .into_iter()
                .map(|map| Value::Object(map.into_iter().collect()))
                .collect();
            let mut tree = json!({"variants": elements.clone()});
            let target = format!("variants[{}].sku", index);

            path::set(&mut tree, &target, value.clone()).unwrap();
            prop_assert_eq!(path::get(&tree, &target).unwrap(), &value);

            let grown = tree["variants"].as_array().unwrap();
            prop_assert_eq!(grown.len(), elements.len().max(index + 1));
            for (position, element) in elements.iter().enumerate() {
                if position != index {
                    prop_assert_eq!(&grown[position], element);
                }
            }
        }

        #[test]
        fn parsed_path_displays_as_written(path in path_strategy()) {
            let parsed = FieldPath::parse(&path).unwrap();
            prop_assert_eq!(parsed.to_string(), path);
        }

        #[test]
        fn get_never_panics_on_arbitrary_paths(path in "[a-z\\[\\]0-9.]{0,20}") {
            let tree = json!({"a": [{"b": 1}], "c": {"d": null}});
            let _ = path::get(&tree, &path);
        }

        #[test]
        fn graphql_id_roundtrip(id in "[a-zA-Z0-9_-]{1,24}", resource in "[A-Z][a-zA-Z]{0,12}") {
            let dispatcher = TransformDispatcher::new();

            let mut encode = FieldMapping::direct("id", "id");
            encode.transform_type = TransformType::GraphqlId;
            encode.transform_config =
                format!(r#"{{"resource_type": "{}", "direction": "to_global"}}"#, resource);

            let mut decode = FieldMapping::direct("id", "id");
            decode.transform_type = TransformType::GraphqlId;
            decode.transform_config = r#"{"direction": "from_global"}"#.to_string();

            let global = dispatcher.apply(&Value::String(id.clone()), &encode).unwrap();
            let local = dispatcher.apply(&global, &decode).unwrap();
            prop_assert_eq!(local, Value::String(id));
        }
    }
}
