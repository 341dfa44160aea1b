//! Consent document conversion.
//!
//! The client stores consent as nested JSON
//! (`{"external":{"youtube":true},"_version":3}`); the resolver works on the
//! flat form (`{"external-youtube": true}`). Path segments are dash-joined,
//! root keys stay unprefixed and `_version` is dropped at every level.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Key of the mandatory version marker.
pub const VERSION_KEY: &str = "_version";

/// Separator between path segments in flat keys.
pub const PATH_SEPARATOR: char = '-';

/// Dash-joined consent path -> decision.
pub type FlatConsentMap = BTreeMap<String, bool>;

/// Flatten a nested consent object into its boolean leaves.
///
/// Non-boolean leaves (numbers, strings, arrays, null) are ignored.
pub fn flatten(document: &Map<String, Value>) -> FlatConsentMap {
    let mut flat = FlatConsentMap::new();
    flatten_into(None, document, &mut flat);
    flat
}

fn flatten_into(prefix: Option<&str>, object: &Map<String, Value>, out: &mut FlatConsentMap) {
    for (key, value) in object {
        if key == VERSION_KEY {
            continue;
        }

        let path = match prefix {
            Some(parent) => format!("{parent}{PATH_SEPARATOR}{key}"),
            None => key.clone(),
        };

        match value {
            Value::Bool(granted) => {
                out.insert(path, *granted);
            }
            Value::Object(children) => flatten_into(Some(&path), children, out),
            other => {
                log::debug!("CONSENT_LEAF_IGNORED path={} type={}", path, json_type(other));
            }
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Rebuild the nested document the client would store for `flat`.
///
/// A key nests under each leading segment until that prefix is itself a
/// recorded decision (`external` next to `external-youtube`). From there the
/// remaining segments stay dash-joined as one literal key, which `flatten`
/// maps back to the same path. Keys with a `_version` segment are skipped.
pub fn hierarchize(flat: &FlatConsentMap, version: u64) -> Value {
    let mut root = Map::new();

    for (key, granted) in flat {
        let segments: Vec<&str> = key.split(PATH_SEPARATOR).collect();
        if segments.iter().any(|segment| *segment == VERSION_KEY) {
            continue;
        }
        insert_path(&mut root, &segments, 0, *granted, flat);
    }

    root.insert(VERSION_KEY.to_string(), Value::from(version));
    Value::Object(root)
}

fn insert_path(
    node: &mut Map<String, Value>,
    segments: &[&str],
    depth: usize,
    granted: bool,
    flat: &FlatConsentMap,
) {
    let nests = depth + 1 < segments.len() && !flat.contains_key(&segments[..=depth].join("-"));
    if nests {
        let child = node
            .entry(segments[depth].to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(children) = child {
            return insert_path(children, segments, depth + 1, granted, flat);
        }
    }

    node.insert(segments[depth..].join("-"), Value::Bool(granted));
}
