//! # Engine Constants
//!
//! Fixed names and markers the engine relies on.
//! These are compiled in and immutable at runtime.

/// Key under which a non-mapping value is wrapped before it is merged into,
/// or merged onto, a mapping (`5` becomes `{value: 5}`).
pub const VALUE_KEY: &str = "value";

/// Property name of the custom one-argument equality hook.
///
/// A mapping or callable whose own `equal` property is a callable delegates
/// deep equality to it.
pub const EQUAL_HOOK_KEY: &str = "equal";

/// Textual form of the remove sentinel.
///
/// Document importers map strings equal to this marker onto
/// [`crate::merge::REMOVE`] when asked to; exporters render the sentinel back
/// as this text.
pub const REMOVE_MARKER_TEXT: &str = "!delete";

/// Separator between path segments (`a.b.2`).
pub const PATH_SEPARATOR: char = '.';

/// Largest index a path segment or [`crate::types::Sequence::set`] may address.
///
/// Bounds the `Absent` padding a single write can allocate. Larger numeric
/// path segments are treated as mapping keys.
pub const MAX_SEQUENCE_INDEX: usize = 65_535;

/// Leaf recorded by `flatten` in place of a reference back to an ancestor.
pub const RECURSIVE_MARKER: &str = "...recursive";

/// Debug prefix of argument-list values.
pub const ARGUMENTS_TAG: &str = "Arguments";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_marker_text_is_stable() {
        // Documents written against earlier releases rely on this spelling.
        assert_eq!(REMOVE_MARKER_TEXT, "!delete");
    }

    #[test]
    fn path_separator_is_dot() {
        assert_eq!(PATH_SEPARATOR, '.');
    }
}
