//! # xmerge-core
//!
//! Deep merge and deep equality over a JSON-like value model - THE LOGIC.
//!
//! This crate implements the merge engine: a recursive, cycle-checked merge
//! of arbitrary value trees, a loose/strict deep equality, and compiled
//! dotted-path accessors built on top of both.
//!
//! ## Module Layout
//!
//! - `types`: the `Value` model, shared handles and crate errors
//! - `primitives`: fixed engine names and markers
//! - `merge`: the merge engine and the `REMOVE` sentinel
//! - `equality`: deep equality
//! - `property`: dotted-path get/set accessors
//! - `shallow`: `extend`, `flatten`, `pluck`, `filter`
//! - `formats`: JSON and TOML import/export
//!
//! ## Constraints
//!
//! - Single-threaded: values share structure through `Rc<RefCell<_>>`
//! - Has NO async, NO file or network I/O (pure Rust)
//! - Merges mutate the target in place; sources are never modified except
//!   where a callable source takes over a non-callable target

// =============================================================================
// MODULES
// =============================================================================

pub mod equality;
pub mod formats;
pub mod merge;
pub mod primitives;
pub mod property;
pub mod shallow;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Callable, DateValue, Identity, Kind, Mapping, MergeError, PatternValue, Sequence, Value,
    XmergeError,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use equality::equals;
pub use merge::{REMOVE, merge, merge_pair};
pub use property::{Property, Segment, property};
pub use shallow::{extend, filter, flatten, pluck};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{
    ImportOptions, MAX_DOCUMENT_SIZE, from_json, from_json_value, from_toml, parse_json,
    parse_toml, to_json,
};
