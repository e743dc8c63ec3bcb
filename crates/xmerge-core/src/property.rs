//! # Path Accessor
//!
//! Compiles dotted paths (`a.b.2.c`) into reusable get/set accessors.
//!
//! - A segment that parses as a non-negative integer up to
//!   `MAX_SEQUENCE_INDEX` addresses a sequence slot; any other segment is a
//!   mapping key.
//! - Get never mutates and stops at the first missing container.
//! - Set creates missing intermediate containers: a sequence when the
//!   following segment is numeric, a mapping otherwise.
//! - A merge-mode accessor routes the final assignment through the merge engine.

use crate::merge::merge_pair;
use crate::primitives::{MAX_SEQUENCE_INDEX, PATH_SEPARATOR};
use crate::types::{Mapping, MergeError, Sequence, Value};
use std::fmt;

/// One step of a compiled path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Index(usize),
    Key(String),
}

impl Segment {
    /// Classify a raw path component.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        // Only whole non-negative decimals are indices: `-1` and `2abc` stay
        // keys, as do indices past MAX_SEQUENCE_INDEX.
        match raw.parse::<usize>() {
            Ok(index) if index <= MAX_SEQUENCE_INDEX => Self::Index(index),
            _ => Self::Key(raw.to_string()),
        }
    }

    /// The mapping key this segment addresses.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Index(index) => index.to_string(),
            Self::Key(key) => key.clone(),
        }
    }

    fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{}", index),
            Self::Key(key) => f.write_str(key),
        }
    }
}

/// Compile `path` into an accessor. An empty path is the identity accessor.
#[must_use]
pub fn property(path: &str, merge_on_set: bool) -> Property {
    Property::compile(path, merge_on_set)
}

/// A compiled path accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    segments: Vec<Segment>,
    merge_on_set: bool,
}

impl Property {
    #[must_use]
    pub fn compile(path: &str, merge_on_set: bool) -> Self {
        let segments = if path.is_empty() {
            Vec::new()
        } else {
            path.split(PATH_SEPARATOR).map(Segment::parse).collect()
        };
        Self {
            segments,
            merge_on_set,
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn merges_on_set(&self) -> bool {
        self.merge_on_set
    }

    /// Combined form: `None` (or `Some(Absent)`) reads, anything else writes.
    pub fn apply(&self, obj: &Value, value: Option<Value>) -> Result<Value, MergeError> {
        match value {
            Some(value) if !value.is_absent() => self.set(obj, value),
            _ => Ok(self.get(obj)),
        }
    }

    /// Read the value at this path, or `Absent` when any step is missing.
    #[must_use]
    pub fn get(&self, obj: &Value) -> Value {
        let mut current = obj.clone();
        for segment in &self.segments {
            match child(&current, segment) {
                Some(next) => current = next,
                None => return Value::Absent,
            }
        }
        current
    }

    /// Write `value` at this path and return the value now stored there.
    ///
    /// Returns `Absent` without side effects on the unreachable part of the
    /// path when a step is not a container (a nullish root included), or when
    /// a key segment addresses a sequence. The identity accessor returns
    /// `value` and writes nothing.
    pub fn set(&self, obj: &Value, value: Value) -> Result<Value, MergeError> {
        let Some((last, init)) = self.segments.split_last() else {
            return Ok(value);
        };

        let mut current = obj.clone();
        for (i, segment) in init.iter().enumerate() {
            let Some(next) = child(&current, segment) else {
                return Ok(Value::Absent);
            };
            current = if next.is_absent() {
                let created = if self.segments[i + 1].is_index() {
                    Value::Sequence(Sequence::new())
                } else {
                    Value::Mapping(Mapping::new())
                };
                if !store(&current, segment, created.clone()) {
                    return Ok(Value::Absent);
                }
                created
            } else {
                next
            };
        }

        let Some(existing) = child(&current, last) else {
            return Ok(Value::Absent);
        };
        let stored = if self.merge_on_set {
            merge_pair(existing, &value)?
        } else {
            value
        };
        if store(&current, last, stored.clone()) {
            Ok(stored)
        } else {
            Ok(Value::Absent)
        }
    }
}

/// Look up `segment` in `container`.
///
/// `None` when `container` cannot hold children; `Some(Absent)` when it can
/// but the slot is empty.
fn child(container: &Value, segment: &Segment) -> Option<Value> {
    if let Some(props) = container.property_mapping() {
        return Some(props.get(&segment.key()).unwrap_or_default());
    }
    let items = container.as_sequence()?;
    Some(match segment {
        Segment::Index(index) => items.get(*index).unwrap_or_default(),
        Segment::Key(_) => Value::Absent,
    })
}

/// Write `value` into `container` at `segment`; `false` when it cannot be stored.
fn store(container: &Value, segment: &Segment, value: Value) -> bool {
    if let Some(props) = container.property_mapping() {
        props.insert(segment.key(), value);
        return true;
    }
    match (container.as_sequence(), segment) {
        (Some(items), Segment::Index(index)) => items.set(*index, value),
        _ => false,
    }
}

// =============================================================================
// TESTS
// =============================================================================
