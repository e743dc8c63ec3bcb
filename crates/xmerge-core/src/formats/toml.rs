//! # TOML Format
//!
//! Import of TOML documents. Tables become mappings, arrays become
//! sequences, and datetimes are kept as their text.
//!
//! There is no TOML export: TOML cannot express null, mixed-kind
//! sequences at the top level, or the absent slots the engine produces.

use super::{ImportOptions, MAX_DOCUMENT_SIZE};
use crate::types::{Mapping, Sequence, Value, XmergeError};

/// Convert a TOML tree into a [`Value`] tree.
#[must_use]
pub fn from_toml(toml: &toml::Value, options: &ImportOptions) -> Value {
    match toml {
        toml::Value::String(s) => options.import_text(s),
        toml::Value::Integer(i) => Value::Number(*i as f64),
        toml::Value::Float(f) => Value::Number(*f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => Value::Text(dt.to_string()),
        toml::Value::Array(items) => Value::Sequence(Sequence::from_vec(
            items.iter().map(|item| from_toml(item, options)).collect(),
        )),
        toml::Value::Table(table) => table_to_value(table, options),
    }
}

fn table_to_value(table: &toml::Table, options: &ImportOptions) -> Value {
    Value::Mapping(Mapping::from_entries(
        table
            .iter()
            .map(|(k, item)| (k.clone(), from_toml(item, options))),
    ))
}

/// Parse TOML document text into a [`Value`] mapping.
pub fn parse_toml(text: &str, options: &ImportOptions) -> Result<Value, XmergeError> {
    if text.len() > MAX_DOCUMENT_SIZE {
        return Err(XmergeError::DeserializationError(format!(
            "Document size {} bytes exceeds maximum allowed {} bytes",
            text.len(),
            MAX_DOCUMENT_SIZE
        )));
    }
    let table: toml::Table = toml::from_str(text)
        .map_err(|e| XmergeError::DeserializationError(format!("Invalid TOML: {}", e)))?;
    Ok(table_to_value(&table, options))
}
