//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore REST wraps every value in a single-key object naming its type:
//! `{"stringValue": "x"}`, `{"integerValue": "42"}`, `{"mapValue": {"fields": {...}}}`.
//! Documents are decoded into plain JSON so the record types can stay
//! ignorant of the wire format. Timestamps decode to RFC 3339 strings.

use serde_json::{Map, Value, json};

use crate::store::StoreError;

/// Encode a plain JSON value as a Firestore value.
#[must_use]
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode every field of a map.
#[must_use]
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Decode a Firestore value into plain JSON.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] for malformed values.
pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let Some((kind, inner)) = value.as_object().and_then(|obj| obj.iter().next()) else {
        return Err(StoreError::Decode(format!("not a typed value: {value}")));
    };

    match (kind.as_str(), inner) {
        ("nullValue", _) => Ok(Value::Null),
        ("booleanValue", Value::Bool(b)) => Ok(Value::Bool(*b)),
        ("integerValue", Value::String(s)) => s
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| StoreError::Decode(format!("integerValue {s}: {e}"))),
        ("integerValue", Value::Number(n)) => Ok(Value::Number(n.clone())),
        ("doubleValue", Value::Number(n)) => Ok(Value::Number(n.clone())),
        // NaN and the infinities arrive as strings and have no JSON form.
        ("doubleValue", Value::String(_)) => Ok(Value::Null),
        (
            "stringValue" | "timestampValue" | "referenceValue" | "bytesValue",
            Value::String(s),
        ) => Ok(Value::String(s.clone())),
        ("geoPointValue", Value::Object(point)) => Ok(Value::Object(point.clone())),
        ("arrayValue", Value::Object(array)) => {
            let values = match array.get("values") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>, _>>()?,
                _ => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        ("mapValue", Value::Object(map)) => {
            let fields = match map.get("fields") {
                Some(Value::Object(fields)) => decode_fields(fields)?,
                _ => Map::new(),
            };
            Ok(Value::Object(fields))
        }
        _ => Err(StoreError::Decode(format!("unsupported value: {value}"))),
    }
}

/// Decode every field of a document.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] if any field is malformed.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, StoreError> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

/// Dotted paths to every leaf of a field map, for use in an update mask.
///
/// Nested maps contribute their leaves rather than themselves, so that a
/// merge touches only the submitted keys. An empty nested map is a leaf.
#[must_use]
pub fn field_paths(fields: &Map<String, Value>) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths(fields, "", &mut paths);
    paths
}

fn collect_paths(fields: &Map<String, Value>, prefix: &str, out: &mut Vec<String>) {
    for (key, value) in fields {
        let segment = quote_segment(key);
        let path = if prefix.is_empty() {
            segment
        } else {
            format!("{prefix}.{segment}")
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => collect_paths(nested, &path, out),
            _ => out.push(path),
        }
    }
}

/// Quote a field name with backticks unless it is a simple identifier.
fn quote_segment(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_owned()
    } else {
        let escaped = name.replace('\\', "\\\\").replace('`', "\\`");
        format!("`{escaped}`")
    }
}
