//! JSON ingestion and path discovery.
//!
//! Uploaded JSON that already matches the chart-data shape passes straight
//! through. Anything else gets its object graph walked for leaf paths (dotted
//! key chains ending in a primitive or an array of primitives); the caller
//! then picks which paths become labels and which become series.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::data::{ChartData, DataValue, Dataset, Paint};
use crate::error::IngestError;
use crate::scheme::random_color;

const MAX_DEFAULT_PATHS: usize = 5;
const SAMPLE_LEN: usize = 20;

/// What is known about one discovered path.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPathInfo {
    pub path: String,
    pub is_array: bool,
    pub is_numeric: bool,
    /// For a root array of objects: the path resolves to a leaf in every
    /// element. An element holding an object (not a leaf) at the path does
    /// not count, so shape disagreement means not common.
    pub common_across_all: bool,
    pub sample_value: String,
}

/// Result of running uploaded JSON through the ingestion pipeline.
#[derive(Debug, Clone)]
pub enum JsonIngest {
    /// The value already satisfied the compatibility predicate.
    Ready(ChartData),
    /// The value needs a path selection before chart data can be built.
    NeedsSelection {
        paths: Vec<JsonPathInfo>,
        default_selection: Vec<String>,
    },
}

/// Parse JSON text and ingest it. Same pipeline for the free-text surface and
/// file uploads.
pub fn ingest_json_text(text: &str) -> Result<(Value, JsonIngest), IngestError> {
    let value: Value = serde_json::from_str(text)?;
    let outcome = ingest_json(&value)?;
    Ok((value, outcome))
}

/// Ingest a parsed JSON value: fast path if compatible, path discovery
/// otherwise.
pub fn ingest_json(value: &Value) -> Result<JsonIngest, IngestError> {
    if !value.is_object() && !value.is_array() {
        return Err(IngestError::NotAnObject);
    }
    if ChartData::value_is_compatible(value) {
        let mut normalized = value.clone();
        stringify_labels(&mut normalized);
        let data: ChartData = serde_json::from_value(normalized)?;
        return Ok(JsonIngest::Ready(data));
    }
    let paths = analyze(value);
    let default_selection = default_selection(&paths);
    Ok(JsonIngest::NeedsSelection { paths, default_selection })
}

/// Labels may be any truthy JSON value; the typed form wants strings, so
/// numeric and boolean labels are stringified in place before decoding.
fn stringify_labels(value: &mut Value) {
    let Some(obj) = value.as_object_mut() else { return };
    if let Some(labels) = obj.get_mut("labels").and_then(Value::as_array_mut) {
        for label in labels.iter_mut() {
            if !label.is_string() {
                *label = Value::String(js_string(label));
            }
        }
    }
    if let Some(datasets) = obj.get_mut("datasets").and_then(Value::as_array_mut) {
        for ds in datasets.iter_mut() {
            if let Some(label) = ds.get_mut("label") {
                if !label.is_string() {
                    *label = Value::String(js_string(label));
                }
            }
        }
    }
}

/// Resolve a dotted path against a value, stepping through object keys only.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// A leaf is a primitive or a non-empty array whose elements are primitives
/// (checked on the first element, as permissive as the walk itself).
fn is_leaf(value: &Value) -> bool {
    match value {
        Value::Object(_) => false,
        Value::Array(items) => {
            !items.is_empty() && !matches!(items[0], Value::Object(_) | Value::Array(_))
        }
        _ => true,
    }
}

/// Depth-first walk of one object, collecting leaf paths with dot-joined
/// keys. Arrays of objects are not descended into; the root-array union in
/// `analyze` handles per-element structure instead.
fn leaf_paths(value: &Value, prefix: &str, out: &mut Vec<String>) {
    let obj = match value.as_object() {
        Some(o) => o,
        None => return,
    };
    for (key, child) in obj {
        let path = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
        if child.is_object() {
            leaf_paths(child, &path, out);
        } else if is_leaf(child) {
            out.push(path);
        }
    }
}

/// Discover every leaf path and classify it.
///
/// Root array of objects: union of leaf paths across elements with a
/// common-across-all count. Any other root: every leaf path, trivially
/// common.
pub fn analyze(value: &Value) -> Vec<JsonPathInfo> {
    let root_objects: Option<&Vec<Value>> = match value.as_array() {
        Some(items) if !items.is_empty() && items[0].is_object() => Some(items),
        _ => None,
    };

    let mut result = Vec::new();
    match root_objects {
        None => {
            let mut paths = Vec::new();
            leaf_paths(value, "", &mut paths);
            for path in paths {
                let resolved = resolve_path(value, &path);
                result.push(JsonPathInfo {
                    is_array: resolved.map_or(false, Value::is_array),
                    is_numeric: resolved.map_or(false, Value::is_number),
                    common_across_all: true,
                    sample_value: sample(resolved),
                    path,
                });
            }
        }
        Some(elements) => {
            // BTreeMap keeps the union ordered for the later sort.
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for element in elements {
                let mut paths = Vec::new();
                leaf_paths(element, "", &mut paths);
                for path in paths {
                    *counts.entry(path).or_insert(0) += 1;
                }
            }
            for (path, count) in counts {
                let first = resolve_path(&elements[0], &path);
                result.push(JsonPathInfo {
                    is_array: first.map_or(false, Value::is_array),
                    is_numeric: first.map_or(false, Value::is_number),
                    common_across_all: count == elements.len(),
                    sample_value: sample(first),
                    path,
                });
            }
        }
    }

    result.sort_by(|a, b| {
        b.common_across_all
            .cmp(&a.common_across_all)
            .then_with(|| a.path.cmp(&b.path))
    });
    result
}

/// Default selection: paths that are both common and numeric, capped at 5;
/// falls back to the first 5 discovered paths.
pub fn default_selection(paths: &[JsonPathInfo]) -> Vec<String> {
    let preferred: Vec<String> = paths
        .iter()
        .filter(|p| p.common_across_all && p.is_numeric)
        .take(MAX_DEFAULT_PATHS)
        .map(|p| p.path.clone())
        .collect();
    if !preferred.is_empty() {
        return preferred;
    }
    paths.iter().take(MAX_DEFAULT_PATHS).map(|p| p.path.clone()).collect()
}

/// Build chart data from selected paths: the first supplies labels, every
/// further path one dataset. Needs at least 2 paths.
pub fn chart_data_from_paths(root: &Value, selected: &[String]) -> Result<ChartData, IngestError> {
    if selected.len() < 2 {
        return Err(IngestError::SelectionTooSmall(selected.len()));
    }

    let labels = labels_for(root, &selected[0]);

    let mut datasets = Vec::new();
    for path in &selected[1..] {
        let data = series_for(root, path);
        let mut ds = Dataset::new(path.clone(), data);
        ds.background_color = Some(Paint::Single(random_color(1.0)));
        ds.border_color = Some(Paint::Single(random_color(1.0)));
        datasets.push(ds);
    }

    let data = ChartData::new(labels, datasets);
    if !data.is_valid() {
        return Err(IngestError::IncompatibleShape);
    }
    Ok(data)
}

fn labels_for(root: &Value, path: &str) -> Vec<String> {
    match resolve_path(root, path) {
        Some(Value::Array(items)) => items.iter().map(js_string).collect(),
        resolved => {
            if let Some(items) = root.as_array() {
                // Root array of objects: fall back to index labels.
                (0..items.len()).map(|i| i.to_string()).collect()
            } else {
                vec![resolved.map(js_string).unwrap_or_default()]
            }
        }
    }
}

fn series_for(root: &Value, path: &str) -> Vec<DataValue> {
    match resolve_path(root, path) {
        Some(Value::Array(items)) => items.iter().map(to_data_value).collect(),
        Some(single) => vec![to_data_value(single)],
        None => match root.as_array() {
            // Resolve independently against every element; a missing or
            // non-object step yields null for that position.
            Some(items) => items
                .iter()
                .map(|item| resolve_path(item, path).map_or(DataValue::Null, to_data_value))
                .collect(),
            None => vec![DataValue::Null],
        },
    }
}

fn to_data_value(value: &Value) -> DataValue {
    serde_json::from_value(value.clone()).unwrap_or(DataValue::Null)
}

/// JS-flavored stringification: strings stay bare, arrays comma-join.
fn js_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            items.iter().map(js_string).collect::<Vec<_>>().join(",")
        }
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn sample(value: Option<&Value>) -> String {
    let s = value.map(js_string).unwrap_or_default();
    if s.chars().count() > SAMPLE_LEN {
        let truncated: String = s.chars().take(SAMPLE_LEN).collect();
        format!("{truncated}...")
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fast_path_shape_idempotent() {
        let v = json!({
            "labels": ["a", "b"],
            "datasets": [{"label": "s1", "data": [1, 2]}]
        });
        match ingest_json(&v).unwrap() {
            JsonIngest::Ready(data) => {
                assert_eq!(data.labels, vec!["a", "b"]);
                assert_eq!(data.datasets.len(), 1);
                assert_eq!(data.datasets[0].label, "s1");
                assert_eq!(data.datasets[0].data, vec![DataValue::Num(1.0), DataValue::Num(2.0)]);
            }
            other => panic!("expected fast path, got {other:?}"),
        }
    }

    #[test]
    fn test_fast_path_stringifies_numeric_labels() {
        let v = json!({
            "labels": [2022, 2023],
            "datasets": [{"label": 7, "data": [1, 2]}]
        });
        match ingest_json(&v).unwrap() {
            JsonIngest::Ready(data) => {
                assert_eq!(data.labels, vec!["2022", "2023"]);
                assert_eq!(data.datasets[0].label, "7");
            }
            other => panic!("expected fast path, got {other:?}"),
        }
    }

    #[test]
    fn test_scalar_root_rejected() {
        assert!(matches!(ingest_json(&json!(42)), Err(IngestError::NotAnObject)));
    }

    #[test]
    fn test_common_path_counting() {
        // "a" appears in 3/3 elements, "b" only in 2/3.
        let v = json!([{"a": 1, "b": 2}, {"a": 3}, {"a": 4, "b": 5}]);
        let paths = analyze(&v);
        let a = paths.iter().find(|p| p.path == "a").unwrap();
        let b = paths.iter().find(|p| p.path == "b").unwrap();
        assert!(a.common_across_all);
        assert!(!b.common_across_all);
        // Common paths sort first.
        assert_eq!(paths[0].path, "a");
    }

    #[test]
    fn test_shape_disagreement_is_not_common() {
        // "a.b" is a leaf in the first element but an object in the second.
        let v = json!([{"a": {"b": 1}}, {"a": {"b": {"c": 2}}}]);
        let paths = analyze(&v);
        let ab = paths.iter().find(|p| p.path == "a.b").unwrap();
        assert!(!ab.common_across_all);
    }

    #[test]
    fn test_nested_paths_dot_joined() {
        let v = json!({"meta": {"year": 2023, "tags": ["x", "y"]}, "total": 7});
        let paths = analyze(&v);
        let names: Vec<&str> = paths.iter().map(|p| p.path.as_str()).collect();
        assert!(names.contains(&"meta.year"));
        assert!(names.contains(&"meta.tags"));
        assert!(names.contains(&"total"));
        assert!(paths.iter().all(|p| p.common_across_all));
        let tags = paths.iter().find(|p| p.path == "meta.tags").unwrap();
        assert!(tags.is_array);
        assert!(!tags.is_numeric);
        let year = paths.iter().find(|p| p.path == "meta.year").unwrap();
        assert!(year.is_numeric);
    }

    #[test]
    fn test_empty_and_object_arrays_are_not_leaves() {
        let v = json!({"empty": [], "objs": [{"x": 1}], "nums": [1, 2]});
        let paths = analyze(&v);
        let names: Vec<&str> = paths.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(names, vec!["nums"]);
    }

    #[test]
    fn test_default_selection_prefers_common_numeric() {
        let v = json!([
            {"name": "a", "v1": 1, "v2": 2, "v3": 3, "v4": 4, "v5": 5, "v6": 6},
            {"name": "b", "v1": 1, "v2": 2, "v3": 3, "v4": 4, "v5": 5, "v6": 6}
        ]);
        let paths = analyze(&v);
        let selected = default_selection(&paths);
        assert_eq!(selected.len(), 5);
        assert!(selected.iter().all(|p| p.starts_with('v')));
    }

    #[test]
    fn test_default_selection_falls_back_to_first_five() {
        let v = json!({"a": "x", "b": "y"});
        let paths = analyze(&v);
        let selected = default_selection(&paths);
        assert_eq!(selected, vec!["a", "b"]);
    }

    #[test]
    fn test_selection_below_two_is_rejected() {
        let v = json!([{"a": 1}, {"a": 2}]);
        let err = chart_data_from_paths(&v, &["a".to_string()]).unwrap_err();
        assert!(matches!(err, IngestError::SelectionTooSmall(1)));
    }

    #[test]
    fn test_chart_from_array_of_objects() {
        let v = json!([
            {"month": "Jan", "sales": 10, "costs": 4},
            {"month": "Feb", "sales": 20},
            {"month": "Mar", "sales": 30, "costs": 9}
        ]);
        let sel = vec!["month".to_string(), "sales".to_string(), "costs".to_string()];
        let data = chart_data_from_paths(&v, &sel).unwrap();
        // "month" is not an array, root is: index labels.
        assert_eq!(data.labels, vec!["0", "1", "2"]);
        assert_eq!(data.datasets.len(), 2);
        assert_eq!(
            data.datasets[0].data,
            vec![DataValue::Num(10.0), DataValue::Num(20.0), DataValue::Num(30.0)]
        );
        // Missing step yields null, not an error.
        assert_eq!(
            data.datasets[1].data,
            vec![DataValue::Num(4.0), DataValue::Null, DataValue::Num(9.0)]
        );
    }

    #[test]
    fn test_chart_from_single_object_with_arrays() {
        let v = json!({"months": ["Jan", "Feb"], "sales": [5, 6]});
        let sel = vec!["months".to_string(), "sales".to_string()];
        let data = chart_data_from_paths(&v, &sel).unwrap();
        assert_eq!(data.labels, vec!["Jan", "Feb"]);
        assert_eq!(data.datasets[0].data, vec![DataValue::Num(5.0), DataValue::Num(6.0)]);
        assert!(data.datasets[0].background_color.is_some());
    }

    #[test]
    fn test_scalar_paths_wrap_in_single_element() {
        let v = json!({"label": "total", "value": 42});
        let sel = vec!["label".to_string(), "value".to_string()];
        let data = chart_data_from_paths(&v, &sel).unwrap();
        assert_eq!(data.labels, vec!["total"]);
        assert_eq!(data.datasets[0].data, vec![DataValue::Num(42.0)]);
    }

    #[test]
    fn test_sample_value_truncation() {
        let v = json!({"long": "abcdefghijklmnopqrstuvwxyz", "short": "abc"});
        let paths = analyze(&v);
        let long = paths.iter().find(|p| p.path == "long").unwrap();
        assert_eq!(long.sample_value, "abcdefghijklmnopqrst...");
        let short = paths.iter().find(|p| p.path == "short").unwrap();
        assert_eq!(short.sample_value, "abc");
    }

    #[test]
    fn test_ingest_json_text_reports_parse_errors() {
        assert!(matches!(
            ingest_json_text("{not json"),
            Err(IngestError::InvalidJson(_))
        ));
    }
}
