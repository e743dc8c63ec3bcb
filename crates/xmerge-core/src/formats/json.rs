//! # JSON Format
//!
//! Conversion between [`Value`] and `serde_json::Value`.
//!
//! File I/O lives in the app layer; everything here is a pure transformation.
//!
//! Export rules:
//! - `Absent` mapping entries are skipped; `Absent` sequence slots become `null`
//! - dates render as epoch milliseconds, patterns as `/source/flags`
//! - the remove sentinel renders as its marker text
//! - non-finite numbers render as `null`
//! - callables and cyclic structures cannot be exported

use super::{ImportOptions, MAX_DOCUMENT_SIZE};
use crate::primitives::REMOVE_MARKER_TEXT;
use crate::types::{Identity, Mapping, Sequence, Value, XmergeError};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number};

/// Largest magnitude at which every integer is exactly representable in `f64`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Convert a JSON tree into a [`Value`] tree.
#[must_use]
pub fn from_json(json: &serde_json::Value, options: &ImportOptions) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => options.import_text(s),
        serde_json::Value::Array(items) => Value::Sequence(Sequence::from_vec(
            items.iter().map(|item| from_json(item, options)).collect(),
        )),
        serde_json::Value::Object(map) => Value::Mapping(Mapping::from_entries(
            map.iter().map(|(k, item)| (k.clone(), from_json(item, options))),
        )),
    }
}

/// Convert an owned JSON tree with default options (no remove marker).
#[must_use]
pub fn from_json_value(json: serde_json::Value) -> Value {
    from_json(&json, &ImportOptions::default())
}

/// Parse JSON text into a [`Value`].
pub fn parse_json(text: &str, options: &ImportOptions) -> Result<Value, XmergeError> {
    if text.len() > MAX_DOCUMENT_SIZE {
        return Err(XmergeError::DeserializationError(format!(
            "Document size {} bytes exceeds maximum allowed {} bytes",
            text.len(),
            MAX_DOCUMENT_SIZE
        )));
    }
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| XmergeError::DeserializationError(format!("Invalid JSON: {}", e)))?;
    Ok(from_json(&json, options))
}

/// Convert a [`Value`] tree into a JSON tree.
pub fn to_json(value: &Value) -> Result<serde_json::Value, XmergeError> {
    Exporter::default().export(value)
}

#[derive(Default)]
struct Exporter {
    ancestors: Vec<Identity>,
}

impl Exporter {
    fn export(&mut self, value: &Value) -> Result<serde_json::Value, XmergeError> {
        Ok(match value {
            Value::Absent | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::from(d.millis()),
            Value::Pattern(p) => serde_json::Value::String(p.to_string()),
            Value::Remove => serde_json::Value::String(REMOVE_MARKER_TEXT.to_string()),
            Value::Callable(c) => {
                return Err(XmergeError::Unrepresentable(format!(
                    "callable `{}` has no JSON form",
                    c.name()
                )));
            }
            Value::Sequence(seq) | Value::Arguments(seq) => {
                self.enter(seq.identity())?;
                let items = seq
                    .to_vec()
                    .iter()
                    .map(|item| self.export(item))
                    .collect::<Result<Vec<_>, _>>();
                self.ancestors.pop();
                serde_json::Value::Array(items?)
            }
            Value::Mapping(m) => {
                self.enter(m.identity())?;
                let entries = self.export_entries(m);
                self.ancestors.pop();
                serde_json::Value::Object(entries?)
            }
        })
    }

    fn export_entries(
        &mut self,
        mapping: &Mapping,
    ) -> Result<Map<String, serde_json::Value>, XmergeError> {
        let mut out = Map::new();
        for (key, item) in mapping.entries() {
            if item.is_absent() {
                continue;
            }
            out.insert(key, self.export(&item)?);
        }
        Ok(out)
    }

    fn enter(&mut self, id: Identity) -> Result<(), XmergeError> {
        if self.ancestors.contains(&id) {
            return Err(XmergeError::SerializationError(
                "cyclic structure has no JSON form".to_string(),
            ));
        }
        self.ancestors.push(id);
        Ok(())
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return serde_json::Value::from(n as i64);
    }
    Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json(self)
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::REMOVE;
    use crate::types::{Callable, DateValue, PatternValue};
    use serde_json::json;

    #[test]
    fn import_preserves_key_order() {
        let value = from_json_value(json!({"z": 1, "a": 2, "m": 3}));
        let keys = value.as_mapping().map(Mapping::keys).expect("mapping");
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn import_maps_marker_to_remove() {
        let options = ImportOptions::with_remove_marker(REMOVE_MARKER_TEXT);
        let value = from_json(&json!({"a": "!delete", "b": "keep"}), &options);
        let m = value.as_mapping().expect("mapping");
        assert!(m.get("a").is_some_and(|v| v.same(&REMOVE)));
        assert!(m.get("b").is_some_and(|v| v.same(&Value::from("keep"))));

        let plain = from_json_value(json!("!delete"));
        assert!(plain.same(&Value::from("!delete")));
    }

    #[test]
    fn export_renders_special_kinds() {
        let value = Value::mapping([
            ("absent", Value::Absent),
            ("date", Value::Date(DateValue::from_millis(5))),
            ("pattern", Value::Pattern(PatternValue::new("a+", "g"))),
            ("remove", REMOVE),
            ("nan", Value::Number(f64::NAN)),
            ("float", Value::Number(1.5)),
            ("int", Value::Number(3.0)),
            (
                "slots",
                Value::sequence(vec![Value::Absent, Value::from(1)]),
            ),
            ("args", Value::arguments(vec![Value::from(2)])),
        ]);
        let json = to_json(&value).expect("export");
        assert_eq!(
            json,
            json!({
                "date": 5,
                "pattern": "/a+/g",
                "remove": "!delete",
                "nan": null,
                "float": 1.5,
                "int": 3,
                "slots": [null, 1],
                "args": [2]
            })
        );
    }

    #[test]
    fn export_rejects_callables() {
        let value = Value::mapping([("f", Value::Callable(Callable::new("f", |_| Value::Null)))]);
        assert!(matches!(
            to_json(&value),
            Err(XmergeError::Unrepresentable(_))
        ));
    }

    #[test]
    fn export_rejects_cycles_but_allows_sharing() {
        let shared = from_json_value(json!({"c": 1}));
        let value = Value::mapping([("a", shared.clone()), ("b", shared)]);
        assert_eq!(
            to_json(&value).expect("export"),
            json!({"a": {"c": 1}, "b": {"c": 1}})
        );

        let cyclic = Mapping::new();
        cyclic.insert("me", Value::Mapping(cyclic.clone()));
        assert!(matches!(
            to_json(&Value::Mapping(cyclic)),
            Err(XmergeError::SerializationError(_))
        ));
    }

    #[test]
    fn serialize_goes_through_export() {
        let value = from_json_value(json!({"a": [1, "x", null]}));
        let text = serde_json::to_string(&value).expect("serialize");
        assert_eq!(text, r#"{"a":[1,"x",null]}"#);
    }

    #[test]
    fn parse_reports_invalid_json() {
        let result = parse_json("{not json", &ImportOptions::default());
        assert!(matches!(
            result,
            Err(XmergeError::DeserializationError(_))
        ));
    }
}
