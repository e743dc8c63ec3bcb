//! # Formats Module
//!
//! Document formats the engine can read and write.
//!
//! - `json`: import and export, plus `serde::Serialize` for [`Value`]
//! - `toml`: import only
//!
//! File I/O operations are in the app layer.

mod json;
mod toml;

pub use self::json::{from_json, from_json_value, parse_json, to_json};
pub use self::toml::{from_toml, parse_toml};

use crate::merge::REMOVE;
use crate::types::Value;

/// Maximum accepted document text size (100 MB).
///
/// Checked before parsing so oversized inputs are rejected without allocating
/// a value tree.
pub const MAX_DOCUMENT_SIZE: usize = 100 * 1024 * 1024;

/// Options applied while importing a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Strings equal to this marker are imported as [`REMOVE`].
    pub remove_marker: Option<String>,
}

impl ImportOptions {
    #[must_use]
    pub fn with_remove_marker(marker: impl Into<String>) -> Self {
        Self {
            remove_marker: Some(marker.into()),
        }
    }

    fn import_text(&self, text: &str) -> Value {
        match &self.remove_marker {
            Some(marker) if marker == text => REMOVE,
            _ => Value::Text(text.to_string()),
        }
    }
}
