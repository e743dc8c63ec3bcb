//! # Shallow Helpers
//!
//! Property-level utilities that copy handles rather than values:
//! `extend`, `flatten`, `pluck` and `filter`.

use crate::primitives::{PATH_SEPARATOR, RECURSIVE_MARKER};
use crate::types::{Identity, Mapping, Value};

/// Copy every own entry of each source onto `target`, in order.
///
/// Later sources overwrite earlier keys. Values are shared, not copied.
/// Sources without properties are ignored, and a `target` without
/// properties is returned untouched.
pub fn extend(target: &Value, sources: &[Value]) -> Value {
    if let Some(props) = target.property_mapping() {
        for source in sources {
            let Some(source_props) = source.property_mapping() else {
                continue;
            };
            for (key, value) in source_props.entries() {
                props.insert(key, value);
            }
        }
    }
    target.clone()
}

/// Flatten a nested tree into one mapping of path to leaf.
///
/// Keys join with `.`; sequence slots render as `[i]`. Non-container input
/// is returned unchanged. Null leaves, empty containers and absent slots
/// produce no entry. An entry pointing back at one of its ancestors is recorded as
/// the recursion marker.
pub fn flatten(value: &Value) -> Value {
    if !value.is_container() {
        return value.clone();
    }
    let out = Mapping::new();
    let mut ancestors = Vec::new();
    flatten_into(value, "", &mut ancestors, &out);
    Value::Mapping(out)
}

fn flatten_into(value: &Value, prefix: &str, ancestors: &mut Vec<Identity>, out: &Mapping) {
    let children: Vec<(String, Value)> = if let Some(items) = value.as_sequence() {
        items
            .to_vec()
            .into_iter()
            .enumerate()
            .map(|(i, item)| (format!("{}[{}]", prefix, i), item))
            .collect()
    } else if let Some(m) = value.as_mapping() {
        m.entries()
            .into_iter()
            .map(|(k, item)| {
                let path = if prefix.is_empty() {
                    k
                } else {
                    format!("{}{}{}", prefix, PATH_SEPARATOR, k)
                };
                (path, item)
            })
            .collect()
    } else {
        return;
    };

    if let Some(id) = value.identity() {
        ancestors.push(id);
    }
    for (path, child) in children {
        if child.is_absent() || child.is_null() {
            continue;
        }
        if !child.is_container() {
            out.insert(path, child);
        } else if child.identity().is_some_and(|id| ancestors.contains(&id)) {
            out.insert(path, Value::text(RECURSIVE_MARKER));
        } else {
            flatten_into(&child, &path, ancestors, out);
        }
    }
    ancestors.pop();
}

/// Copy a subset of `obj`'s entries into a new mapping.
///
/// `include` lists the keys to take in order (`None` takes every key);
/// keys in `exclude` or not present are skipped. With `delete`, taken keys
/// are also removed from `obj`.
pub fn pluck(obj: &Mapping, include: Option<&[&str]>, exclude: &[&str], delete: bool) -> Mapping {
    let keys: Vec<String> = match include {
        Some(keys) => keys.iter().map(|k| (*k).to_string()).collect(),
        None => obj.keys(),
    };
    let out = Mapping::new();
    for key in keys {
        if exclude.contains(&key.as_str()) {
            continue;
        }
        let Some(value) = obj.get(&key) else {
            continue;
        };
        if delete {
            obj.remove(&key);
        }
        out.insert(key, value);
    }
    out
}

/// Copy every entry of `obj` except those in `exclude`.
pub fn filter(obj: &Mapping, exclude: &[&str]) -> Mapping {
    pluck(obj, None, exclude, false)
}

// =============================================================================
// TESTS
// =============================================================================
