//! # Core Type Definitions
//!
//! This module contains the value model shared by every engine component:
//! - The dynamic `Value` sum type and its scalar kinds (`DateValue`, `PatternValue`)
//! - Shared container handles (`Mapping`, `Sequence`, `Callable`)
//! - Opaque identity tokens (`Identity`) used for cycle detection
//! - Error types (`MergeError`, `XmergeError`)
//!
//! ## Sharing Semantics
//!
//! Containers are reference handles. Cloning a `Value` clones the handle,
//! never the data, so two clones observe each other's mutations and compare
//! identical under [`Value::same`]. Deep copies are only ever produced by the
//! merge engine.

use crate::primitives::{ARGUMENTS_TAG, MAX_SEQUENCE_INDEX, REMOVE_MARKER_TEXT};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

// =============================================================================
// IDENTITY
// =============================================================================

/// Opaque identity token of a shared handle.
///
/// Two tokens are equal exactly when they were taken from the same allocation.
/// Tokens are only meaningful while the handle they came from is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(usize);

impl Identity {
    fn of<T: ?Sized>(rc: &Rc<T>) -> Self {
        Self(Rc::as_ptr(rc).cast::<()>() as usize)
    }
}

// =============================================================================
// SCALAR KINDS
// =============================================================================

/// A point in time, stored as milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateValue(pub i64);

impl DateValue {
    /// Create a date from epoch milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// The epoch scalar this date compares by.
    #[must_use]
    pub const fn millis(self) -> i64 {
        self.0
    }
}

/// A regular expression literal, kept as its source and flags.
///
/// The engine never evaluates patterns; it copies and compares them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternValue {
    source: String,
    flags: String,
}

impl PatternValue {
    /// Create a pattern from its source text and flags.
    #[must_use]
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            flags: flags.into(),
        }
    }

    /// Parse the `/source/flags` literal form.
    ///
    /// Returns `None` when the text is not delimited by slashes.
    #[must_use]
    pub fn parse_literal(literal: &str) -> Option<Self> {
        let body = literal.strip_prefix('/')?;
        let end = body.rfind('/')?;
        let (source, flags) = body.split_at(end);
        let flags = &flags[1..];
        if flags.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(Self::new(source, flags))
        } else {
            None
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn flags(&self) -> &str {
        &self.flags
    }
}

impl fmt::Display for PatternValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

// =============================================================================
// MAPPING
// =============================================================================

/// Shared, string-keyed, insertion-order-preserving container.
///
/// Lookups are linear; mappings in merge workloads are small and order is
/// part of the observable result.
#[derive(Clone, Default)]
pub struct Mapping(Rc<RefCell<Vec<(String, Value)>>>);

impl Mapping {
    /// Create a new empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mapping from key/value pairs. Later duplicates replace earlier ones.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mapping = Self::new();
        for (key, value) in entries {
            mapping.insert(key, value);
        }
        mapping
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Get a handle to the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().iter().any(|(k, _)| k == key)
    }

    /// Insert or replace `key`. Replacing keeps the key's original position.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        let mut entries = self.0.borrow_mut();
        if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        entries.push((key, value));
        None
    }

    /// Delete `key`, preserving the order of the remaining keys.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut entries = self.0.borrow_mut();
        let position = entries.iter().position(|(k, _)| k == key)?;
        Some(entries.remove(position).1)
    }

    /// Snapshot of the keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().iter().map(|(k, _)| k.clone()).collect()
    }

    /// Snapshot of the entries in insertion order.
    ///
    /// The snapshot holds handles, so callers may mutate the mapping while
    /// iterating it.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0.borrow().clone()
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::of(&self.0)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_debug(&Value::Mapping(self.clone()), f, &mut Vec::new())
    }
}

// =============================================================================
// SEQUENCE
// =============================================================================

/// Shared, index-addressed, length-bearing container.
#[derive(Clone, Default)]
pub struct Sequence(Rc<RefCell<Vec<Value>>>);

impl Sequence {
    /// Create a new empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    /// Store `value` at `index`, padding any gap with `Absent` slots.
    ///
    /// Returns `false` and stores nothing when `index` is past
    /// [`MAX_SEQUENCE_INDEX`] and beyond the current length.
    pub fn set(&self, index: usize, value: Value) -> bool {
        let mut items = self.0.borrow_mut();
        if index < items.len() {
            items[index] = value;
            return true;
        }
        if index > MAX_SEQUENCE_INDEX {
            return false;
        }
        items.resize(index, Value::Absent);
        items.push(value);
        true
    }

    /// Snapshot of the elements.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::of(&self.0)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_debug(&Value::Sequence(self.clone()), f, &mut Vec::new())
    }
}

// =============================================================================
// CALLABLE
// =============================================================================

/// Signature of the invocable wrapped by a [`Callable`].
pub type NativeFn = dyn Fn(&[Value]) -> Value;

struct CallableInner {
    name: String,
    func: Box<NativeFn>,
    props: Mapping,
}

/// A function value that also carries a mapping of named properties.
///
/// Merging a mapping into a callable merges into its properties; the
/// invocable itself is never copied.
#[derive(Clone)]
pub struct Callable(Rc<CallableInner>);

impl Callable {
    /// Wrap an invocable under a display name, with no properties.
    pub fn new(name: impl Into<String>, func: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self(Rc::new(CallableInner {
            name: name.into(),
            func: Box::new(func),
            props: Mapping::new(),
        }))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Invoke the wrapped function.
    pub fn call(&self, args: &[Value]) -> Value {
        (self.0.func)(args)
    }

    /// The property mapping attached to this function.
    #[must_use]
    pub fn props(&self) -> &Mapping {
        &self.0.props
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::of(&self.0)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_debug(&Value::Callable(self.clone()), f, &mut Vec::new())
    }
}

// =============================================================================
// VALUE
// =============================================================================

/// A dynamically typed, JSON-like value.
#[derive(Clone, Default)]
pub enum Value {
    /// Missing / undefined.
    #[default]
    Absent,
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(DateValue),
    Pattern(PatternValue),
    /// The key-deletion sentinel. See [`crate::merge::REMOVE`].
    Remove,
    /// A true ordered sequence.
    Sequence(Sequence),
    /// An array-like argument list: behaves as a sequence, but is not one.
    Arguments(Sequence),
    Mapping(Mapping),
    Callable(Callable),
}

/// Coarse classification of a [`Value`], used in logs and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Absent,
    Null,
    Bool,
    Number,
    Text,
    Date,
    Pattern,
    Remove,
    Sequence,
    Arguments,
    Mapping,
    Callable,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Absent => "absent",
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::Text => "text",
            Self::Date => "date",
            Self::Pattern => "pattern",
            Self::Remove => "remove-marker",
            Self::Sequence => "sequence",
            Self::Arguments => "arguments",
            Self::Mapping => "mapping",
            Self::Callable => "callable",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Create a text value.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Create a mapping value from key/value pairs.
    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Mapping(Mapping::from_entries(entries))
    }

    /// Create a sequence value from its elements.
    #[must_use]
    pub fn sequence(items: Vec<Value>) -> Self {
        Self::Sequence(Sequence::from_vec(items))
    }

    /// Create an argument-list value from its elements.
    #[must_use]
    pub fn arguments(items: Vec<Value>) -> Self {
        Self::Arguments(Sequence::from_vec(items))
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Absent => Kind::Absent,
            Self::Null => Kind::Null,
            Self::Bool(_) => Kind::Bool,
            Self::Number(_) => Kind::Number,
            Self::Text(_) => Kind::Text,
            Self::Date(_) => Kind::Date,
            Self::Pattern(_) => Kind::Pattern,
            Self::Remove => Kind::Remove,
            Self::Sequence(_) => Kind::Sequence,
            Self::Arguments(_) => Kind::Arguments,
            Self::Mapping(_) => Kind::Mapping,
            Self::Callable(_) => Kind::Callable,
        }
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `Null` or `Absent`.
    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Null | Self::Absent)
    }

    #[must_use]
    pub fn is_nan(&self) -> bool {
        matches!(self, Self::Number(n) if n.is_nan())
    }

    /// A true sequence or an argument list.
    #[must_use]
    pub fn is_sequence_like(&self) -> bool {
        matches!(self, Self::Sequence(_) | Self::Arguments(_))
    }

    /// Mapping, sequence or argument list: values compared key by key.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Mapping(_) | Self::Sequence(_) | Self::Arguments(_)
        )
    }

    /// Values that are deep-copied rather than shared when adopted into a
    /// sequence: containers plus the opaque date and pattern kinds.
    #[must_use]
    pub fn is_object(&self) -> bool {
        self.is_container() || matches!(self, Self::Date(_) | Self::Pattern(_))
    }

    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// The elements handle of a sequence or argument list.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Self::Sequence(s) | Self::Arguments(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Self::Callable(c) => Some(c),
            _ => None,
        }
    }

    /// The mapping that holds this value's named properties, if it has any:
    /// a mapping itself, or the property mapping of a callable.
    #[must_use]
    pub fn property_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            Self::Callable(c) => Some(c.props()),
            _ => None,
        }
    }

    /// Identity token of a shared handle; `None` for by-value kinds.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        match self {
            Self::Mapping(m) => Some(m.identity()),
            Self::Sequence(s) | Self::Arguments(s) => Some(s.identity()),
            Self::Callable(c) => Some(c.identity()),
            _ => None,
        }
    }

    /// Strict sameness (`===`): by-value kinds compare by value, shared
    /// handles by identity. `NaN` is never the same as anything.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Absent, Self::Absent)
            | (Self::Null, Self::Null)
            | (Self::Remove, Self::Remove) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) | (Self::Arguments(a), Self::Arguments(b)) => {
                a.ptr_eq(b)
            }
            (Self::Mapping(a), Self::Mapping(b)) => a.ptr_eq(b),
            (Self::Callable(a), Self::Callable(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Truthiness: `Absent`, `Null`, `false`, `0`, `NaN` and `""` are falsy.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Absent | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// String conversion used by loose comparison and default sort order.
    ///
    /// Sequences join their elements with `,` (nullish elements render empty,
    /// a sequence reached again through itself renders empty).
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        write_text(self, &mut text, &mut Vec::new());
        text
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_debug(self, f, &mut Vec::new())
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<DateValue> for Value {
    fn from(d: DateValue) -> Self {
        Self::Date(d)
    }
}

impl From<PatternValue> for Value {
    fn from(p: PatternValue) -> Self {
        Self::Pattern(p)
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Self::Mapping(m)
    }
}

impl From<Sequence> for Value {
    fn from(s: Sequence) -> Self {
        Self::Sequence(s)
    }
}

impl From<Callable> for Value {
    fn from(c: Callable) -> Self {
        Self::Callable(c)
    }
}

// =============================================================================
// RENDERING HELPERS
// =============================================================================

/// Render a number the way a JSON-like runtime prints it: integral values
/// without a fractional part, `NaN`, `Infinity`, `-Infinity`, and `0` for
/// negative zero.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

/// Compare two values by their text rendering, `Absent` sorting last.
pub(crate) fn default_order(a: &Value, b: &Value) -> Ordering {
    match (a.is_absent(), b.is_absent()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.to_text().cmp(&b.to_text()),
    }
}

fn write_text(value: &Value, out: &mut String, seen: &mut Vec<Identity>) {
    match value {
        Value::Absent => out.push_str("undefined"),
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&format_number(*n)),
        Value::Text(s) => out.push_str(s),
        Value::Date(d) => out.push_str(&d.millis().to_string()),
        Value::Pattern(p) => out.push_str(&p.to_string()),
        Value::Remove => out.push_str(REMOVE_MARKER_TEXT),
        Value::Sequence(seq) | Value::Arguments(seq) => {
            let id = seq.identity();
            if seen.contains(&id) {
                return;
            }
            seen.push(id);
            for (i, item) in seq.to_vec().iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                if !item.is_nullish() {
                    write_text(item, out, seen);
                }
            }
            seen.pop();
        }
        Value::Mapping(_) => out.push_str("[object Object]"),
        Value::Callable(c) => {
            out.push_str("function ");
            out.push_str(c.name());
            out.push_str("() { [native code] }");
        }
    }
}

fn write_debug(
    value: &Value,
    f: &mut fmt::Formatter<'_>,
    seen: &mut Vec<Identity>,
) -> fmt::Result {
    if let Some(id) = value.identity() {
        if seen.contains(&id) {
            return f.write_str("<cycle>");
        }
        seen.push(id);
    }
    let result = match value {
        Value::Absent => f.write_str("undefined"),
        Value::Null => f.write_str("null"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Number(n) => f.write_str(&format_number(*n)),
        Value::Text(s) => write!(f, "{:?}", s),
        Value::Date(d) => write!(f, "Date({})", d.millis()),
        Value::Pattern(p) => write!(f, "{}", p),
        Value::Remove => f.write_str("<remove>"),
        Value::Sequence(seq) => write_debug_items(seq, "", f, seen),
        Value::Arguments(seq) => write_debug_items(seq, ARGUMENTS_TAG, f, seen),
        Value::Mapping(m) => write_debug_entries(m, f, seen),
        Value::Callable(c) => {
            write!(f, "<fn {}>", c.name())?;
            if c.props().is_empty() {
                Ok(())
            } else {
                write_debug_entries(c.props(), f, seen)
            }
        }
    };
    if value.identity().is_some() {
        seen.pop();
    }
    result
}

fn write_debug_items(
    seq: &Sequence,
    tag: &str,
    f: &mut fmt::Formatter<'_>,
    seen: &mut Vec<Identity>,
) -> fmt::Result {
    write!(f, "{}[", tag)?;
    for (i, item) in seq.to_vec().iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_debug(item, f, seen)?;
    }
    f.write_str("]")
}

fn write_debug_entries(
    mapping: &Mapping,
    f: &mut fmt::Formatter<'_>,
    seen: &mut Vec<Identity>,
) -> fmt::Result {
    f.write_str("{")?;
    for (i, (key, item)) in mapping.entries().iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{:?}: ", key)?;
        write_debug(item, f, seen)?;
    }
    f.write_str("}")
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// The single fatal condition of the merge engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// A mapping merge re-entered a value that is already being merged.
    #[error("can not merge cyclic structures (detected at mapping depth {depth})")]
    CyclicStructure { depth: usize },
}

/// Errors that can occur across the xmerge system.
///
/// - No silent failures
/// - Use `Result<T, XmergeError>` for fallible operations outside the engine
#[derive(Debug, Error)]
pub enum XmergeError {
    /// The merge engine rejected its input.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// The value has no representation in the requested output format.
    #[error("Unrepresentable value: {0}")]
    Unrepresentable(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
