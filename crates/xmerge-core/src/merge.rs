//! # Merge Engine
//!
//! Recursively combines a target value with one or more sources.
//!
//! Rules, first match wins, for one `(target, source)` step:
//!
//! | target \ source        | Absent | Null | primitive          | callable        | sequence            | mapping            |
//! |------------------------|--------|------|--------------------|-----------------|---------------------|--------------------|
//! | same as source         | target | target | target           | target          | target              | target             |
//! | Null / Absent          | target | Null | adopt              | adopt           | deep copy           | deep copy          |
//! | sequence               | target | Null | set-append `[s]`   | set-append `[s]`| set-append          | set-append `[s]`   |
//! | primitive              | target | Null | replace            | role swap       | `[t]` + set-append  | `{value: t}` + merge |
//! | callable               | target | Null | `{value: s}` merge | replace         | see below           | merge into props   |
//! | mapping                | target | Null | `{value: s}` merge | role swap       | `[t]` + set-append  | merge by key       |
//!
//! A callable target merged with a non-empty sequence of callables becomes
//! `[t, ...]`; with any other sequence the sequence is stored under `value`.
//!
//! Set-append dedups primitive and callable elements by sameness, and
//! containers by loose [`equals`] against the target's original elements.
//! Appended containers are deep-copied. Sequence merges are not cycle-checked.

use crate::equality::equals;
use crate::primitives::VALUE_KEY;
use crate::types::{Identity, Mapping, MergeError, Sequence, Value};
use tracing::{debug, trace, warn};

/// The remove sentinel: a mapping source property holding this value deletes
/// the target's key instead of merging into it.
pub const REMOVE: Value = Value::Remove;

/// Merge every source into `target`, left to right.
///
/// One [`VisitedStack`] is shared across the whole fold.
pub fn merge(target: Value, sources: &[Value]) -> Result<Value, MergeError> {
    debug!(
        target_kind = %target.kind(),
        sources = sources.len(),
        "merging"
    );
    let mut engine = MergeEngine::new();
    sources
        .iter()
        .try_fold(target, |acc, source| engine.merge(acc, source))
}

/// Merge a single source into `target`.
pub fn merge_pair(target: Value, source: &Value) -> Result<Value, MergeError> {
    MergeEngine::new().merge(target, source)
}

// =============================================================================
// VISITED STACK
// =============================================================================

/// Identity pairs of the mapping merges currently in progress.
///
/// A mapping merge re-enters when either side of the new step is a source
/// that an enclosing step is still merging from.
#[derive(Debug, Default)]
pub struct VisitedStack {
    frames: Vec<(Identity, Identity)>,
}

impl VisitedStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_reentry(&self, target: Identity, source: Identity) -> bool {
        self.frames
            .iter()
            .any(|&(_, visited)| visited == source || visited == target)
    }

    pub fn push(&mut self, target: Identity, source: Identity) {
        self.frames.push((target, source));
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

// =============================================================================
// MERGE ENGINE
// =============================================================================

/// Pairwise merge state for one top-level call.
#[derive(Debug, Default)]
pub struct MergeEngine {
    visited: VisitedStack,
}

impl MergeEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `source` into `target` and return the resulting value.
    ///
    /// The result is `target` itself whenever its kind can absorb the source;
    /// otherwise it is a newly built value (or, for a callable source, the
    /// source itself).
    pub fn merge(&mut self, target: Value, source: &Value) -> Result<Value, MergeError> {
        if target.same(source) {
            return Ok(target);
        }
        match source {
            Value::Absent => return Ok(target),
            Value::Null => return Ok(Value::Null),
            _ => {}
        }
        if target.is_nullish() {
            return self.adopt(source);
        }

        if source.as_callable().is_some() && !target.is_sequence_like() {
            if target.as_callable().is_some() {
                return Ok(source.clone());
            }
            trace!(target_kind = %target.kind(), "role swap: callable source absorbs target");
            return self.merge(source.clone(), &target);
        }

        match &target {
            Value::Sequence(items) => {
                let items = items.clone();
                self.append_set(items, source)
            }
            Value::Arguments(args) => {
                trace!("converting argument list target into a sequence");
                let items = Sequence::from_vec(args.to_vec());
                self.append_set(items, source)
            }
            Value::Mapping(props) => {
                let props = props.clone();
                self.merge_into_object(target, props, source)
            }
            Value::Callable(callable) => {
                let props = callable.props().clone();
                self.merge_into_object(target, props, source)
            }
            _ => self.merge_into_primitive(target, source),
        }
    }

    /// A nullish target takes on the source: containers are deep-copied,
    /// everything else is adopted as is.
    fn adopt(&mut self, source: &Value) -> Result<Value, MergeError> {
        match source {
            Value::Sequence(_) | Value::Arguments(_) => self.append_set(Sequence::new(), source),
            Value::Mapping(_) => self.merge(Value::Mapping(Mapping::new()), source),
            other => Ok(other.clone()),
        }
    }

    fn merge_into_primitive(&mut self, target: Value, source: &Value) -> Result<Value, MergeError> {
        match source {
            Value::Sequence(_) | Value::Arguments(_) => {
                trace!(target_kind = %target.kind(), "transmuting primitive target into [target]");
                self.append_set(Sequence::from_vec(vec![target]), source)
            }
            Value::Mapping(_) => {
                trace!(target_kind = %target.kind(), "transmuting primitive target into {{value: target}}");
                self.merge(wrap_value(target), source)
            }
            other => Ok(other.clone()),
        }
    }

    fn merge_into_object(
        &mut self,
        target: Value,
        props: Mapping,
        source: &Value,
    ) -> Result<Value, MergeError> {
        match source {
            Value::Sequence(items) | Value::Arguments(items) => {
                let absorb_as_value = target.as_callable().is_some() && {
                    let elements = items.to_vec();
                    elements.is_empty() || !elements.iter().all(|e| e.as_callable().is_some())
                };
                if absorb_as_value {
                    trace!("storing sequence source under the callable's value property");
                    self.merge(target, &wrap_value(source.clone()))
                } else {
                    trace!(target_kind = %target.kind(), "transmuting target into [target]");
                    self.append_set(Sequence::from_vec(vec![target]), source)
                }
            }
            Value::Mapping(src) => {
                self.merge_mappings(&props, src)?;
                Ok(target)
            }
            other => self.merge(target, &wrap_value(other.clone())),
        }
    }

    fn merge_mappings(&mut self, dest: &Mapping, src: &Mapping) -> Result<(), MergeError> {
        let (target_id, source_id) = (dest.identity(), src.identity());
        if self.visited.is_reentry(target_id, source_id) {
            let depth = self.visited.depth();
            warn!(depth, "rejecting cyclic structure");
            return Err(MergeError::CyclicStructure { depth });
        }

        self.visited.push(target_id, source_id);
        let result = self.merge_entries(dest, src);
        self.visited.pop();
        result
    }

    fn merge_entries(&mut self, dest: &Mapping, src: &Mapping) -> Result<(), MergeError> {
        for (key, incoming) in src.entries() {
            if matches!(incoming, Value::Remove) {
                dest.remove(&key);
                continue;
            }
            let current = dest.get(&key).unwrap_or_default();
            let merged = self.merge(current, &incoming)?;
            if !merged.is_absent() {
                dest.insert(key, merged);
            }
        }
        Ok(())
    }

    /// Append the elements of `source` (or `source` itself when it is not a
    /// sequence) that `items` does not already hold.
    fn append_set(&mut self, items: Sequence, source: &Value) -> Result<Value, MergeError> {
        let incoming = match source.as_sequence() {
            Some(seq) => seq.to_vec(),
            None => vec![source.clone()],
        };
        let existing = items.to_vec();

        for element in incoming {
            if existing.iter().any(|e| e.same(&element)) {
                continue;
            }
            if !element.is_object() {
                items.push(element);
                continue;
            }
            if existing.iter().any(|e| equals(e, &element, false)) {
                continue;
            }
            let copy = self.adopt(&element)?;
            items.push(copy);
        }
        Ok(Value::Sequence(items))
    }
}

/// `{value: v}`
fn wrap_value(value: Value) -> Value {
    Value::mapping([(VALUE_KEY, value)])
}

// =============================================================================
// TESTS
// =============================================================================
