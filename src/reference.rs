//! Reference Collection
//!
//! Walks a parsed JSON document and collects every `$ref` string, however
//! deeply nested. References are opaque `uri#/path/to/node` strings; callers
//! split them with [`split_reference`] when they need the parts.

use serde_json::Value;

/// Key that marks a reference inside a schema document
pub const REF_KEY: &str = "$ref";

/// Collect every reference in `value`, in traversal order, duplicates kept
pub fn collect_refs(value: &Value) -> Vec<String> {
    let mut refs = Vec::new();
    walk(value, &mut refs);
    refs
}

fn walk(value: &Value, refs: &mut Vec<String>) {
    match value {
        Value::Object(obj) => {
            for (key, field) in obj {
                match field {
                    Value::String(target) if key == REF_KEY => refs.push(target.clone()),
                    Value::Object(_) | Value::Array(_) => walk(field, refs),
                    _ => {}
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, refs);
            }
        }
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => {}
    }
}

/// Split a reference into its document URI and in-document fragment.
///
/// The fragment is returned without the leading `#`. A reference with no
/// `#` points at the whole document and yields an empty fragment.
pub fn split_reference(reference: &str) -> (&str, &str) {
    match reference.split_once('#') {
        Some((uri, fragment)) => (uri, fragment),
        None => (reference, ""),
    }
}

/// Document URI part of a reference
pub fn document_uri(reference: &str) -> &str {
    split_reference(reference).0
}

/// Whether the reference's document lives under `base`
pub fn is_under_base(reference: &str, base: &str) -> bool {
    document_uri(reference).starts_with(base)
}

/// Split a fragment into literal property names.
///
/// Segments are used verbatim: `~0`/`~1` escapes and percent-encoding are
/// not decoded.
pub fn fragment_segments(fragment: &str) -> impl Iterator<Item = &str> {
    fragment.split('/').filter(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collects_nested_refs_in_order() {
        let doc = json!({
            "a": { "$ref": "x.json#/one" },
            "b": [
                { "$ref": "x.json#/two" },
                [ { "deep": { "$ref": "y.json#/three" } } ]
            ],
            "c": { "d": { "e": { "$ref": "x.json#/one" } } }
        });

        assert_eq!(
            collect_refs(&doc),
            vec!["x.json#/one", "x.json#/two", "y.json#/three", "x.json#/one"]
        );
    }

    #[test]
    fn test_ignores_non_string_ref_values() {
        let doc = json!({
            "$ref": 42,
            "nested": { "$ref": { "$ref": "inner.json#/a" } }
        });

        assert_eq!(collect_refs(&doc), vec!["inner.json#/a"]);
    }

    #[test]
    fn test_scalar_documents_have_no_refs() {
        assert!(collect_refs(&json!("x.json#/a")).is_empty());
        assert!(collect_refs(&json!(null)).is_empty());
    }

    #[test]
    fn test_split_reference() {
        assert_eq!(
            split_reference("https://host/schemas/a.json#/resourceDefinitions/b"),
            ("https://host/schemas/a.json", "/resourceDefinitions/b")
        );
        assert_eq!(split_reference("a.json"), ("a.json", ""));
    }

    #[test]
    fn test_fragment_segments_are_literal() {
        let segments: Vec<_> = fragment_segments("/definitions/a~1b/c%20d").collect();
        assert_eq!(segments, vec!["definitions", "a~1b", "c%20d"]);
    }
}
