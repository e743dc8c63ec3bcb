//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Commands return values; rendering and writing happen in [`emit`] and
//! [`emit_text`] so commands can be exercised without capturing stdout.

use super::DocumentFormat;
use std::path::{Path, PathBuf};
use xmerge_core::{
    ImportOptions, MAX_DOCUMENT_SIZE, Value, XmergeError, equals, flatten, merge, parse_json,
    parse_toml, property, to_json,
};

// =============================================================================
// OPTIONS
// =============================================================================

/// How input documents are read.
#[derive(Debug, Clone)]
pub struct InputOptions {
    pub format: DocumentFormat,
    pub import: ImportOptions,
}

impl InputOptions {
    /// Build input options; an empty `remove_marker` disables the marker.
    pub fn new(format: DocumentFormat, remove_marker: &str) -> Self {
        let import = if remove_marker.is_empty() {
            ImportOptions::default()
        } else {
            ImportOptions::with_remove_marker(remove_marker)
        };
        Self { format, import }
    }
}

/// Where and how results are written.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub compact: bool,
    pub path: Option<PathBuf>,
}

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), XmergeError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| XmergeError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(XmergeError::DeserializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path, requiring an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, XmergeError> {
    let canonical = path.canonicalize().map_err(|e| {
        XmergeError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(XmergeError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path whose parent directory must already exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, XmergeError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        XmergeError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(XmergeError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| XmergeError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// DOCUMENT I/O
// =============================================================================

fn resolve_format(path: &Path, format: DocumentFormat) -> DocumentFormat {
    match format {
        DocumentFormat::Auto => {
            let is_toml = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
            if is_toml {
                DocumentFormat::Toml
            } else {
                DocumentFormat::Json
            }
        }
        explicit => explicit,
    }
}

/// Read and parse one input document.
pub fn load_document(path: &Path, input: &InputOptions) -> Result<Value, XmergeError> {
    let validated_path = validate_file_path(path)?;
    validate_file_size(&validated_path, MAX_DOCUMENT_SIZE as u64)?;

    let text = std::fs::read_to_string(&validated_path)
        .map_err(|e| XmergeError::IoError(format!("Read file '{}': {}", path.display(), e)))?;

    let format = resolve_format(path, input.format);
    tracing::debug!(path = %path.display(), ?format, bytes = text.len(), "loading document");

    match format {
        DocumentFormat::Toml => parse_toml(&text, &input.import),
        DocumentFormat::Json | DocumentFormat::Auto => parse_json(&text, &input.import),
    }
}

/// Render a value as JSON text.
pub fn render(value: &Value, compact: bool) -> Result<String, XmergeError> {
    let json = to_json(value)?;
    let rendered = if compact {
        serde_json::to_string(&json)
    } else {
        serde_json::to_string_pretty(&json)
    };
    rendered.map_err(|e| XmergeError::SerializationError(e.to_string()))
}

/// Render `value` and write it to the configured destination.
pub fn emit(value: &Value, output: &OutputOptions) -> Result<(), XmergeError> {
    let text = render(value, output.compact)?;
    emit_text(&text, output)
}

/// Write `text` to the output file, or stdout when none is configured.
pub fn emit_text(text: &str, output: &OutputOptions) -> Result<(), XmergeError> {
    match &output.path {
        Some(path) => {
            let validated = validate_output_path(path)?;
            std::fs::write(&validated, format!("{}\n", text))
                .map_err(|e| XmergeError::IoError(format!("Write output: {}", e)))?;
            tracing::info!(path = %validated.display(), "wrote result");
        }
        None => println!("{}", text),
    }
    Ok(())
}

// =============================================================================
// MERGE COMMAND
// =============================================================================

/// Merge every file into the first, left to right.
pub fn cmd_merge(files: &[PathBuf], input: &InputOptions) -> Result<Value, XmergeError> {
    let Some((first, rest)) = files.split_first() else {
        return Err(XmergeError::IoError("No input files given".to_string()));
    };

    tracing::info!(files = files.len(), "merging documents");

    let target = load_document(first, input)?;
    let sources = rest
        .iter()
        .map(|path| load_document(path, input))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(merge(target, &sources)?)
}

// =============================================================================
// EQUALS COMMAND
// =============================================================================

/// Deep-compare two documents.
pub fn cmd_equals(
    left: &Path,
    right: &Path,
    strict: bool,
    input: &InputOptions,
) -> Result<bool, XmergeError> {
    let left = load_document(left, input)?;
    let right = load_document(right, input)?;
    let equal = equals(&left, &right, strict);
    tracing::debug!(strict, equal, "compared documents");
    Ok(equal)
}

// =============================================================================
// PATH COMMANDS
// =============================================================================

/// Read the value at `path`.
pub fn cmd_get(file: &Path, path: &str, input: &InputOptions) -> Result<Value, XmergeError> {
    let document = load_document(file, input)?;
    Ok(property(path, false).get(&document))
}

/// Store the JSON `value` at `path` and return the updated document.
pub fn cmd_set(
    file: &Path,
    path: &str,
    value: &str,
    merge_on_set: bool,
    input: &InputOptions,
) -> Result<Value, XmergeError> {
    let document = load_document(file, input)?;
    let value = parse_json(value, &input.import)?;

    let accessor = property(path, merge_on_set);
    let stored = accessor.set(&document, value)?;
    if stored.is_absent() && !accessor.segments().is_empty() {
        tracing::warn!(path, "path is not addressable in this document; nothing stored");
    }

    // The identity path replaces the whole document.
    if accessor.segments().is_empty() {
        return Ok(stored);
    }
    Ok(document)
}

// =============================================================================
// FLATTEN COMMAND
// =============================================================================

/// Flatten a document to dotted keys.
pub fn cmd_flatten(file: &Path, input: &InputOptions) -> Result<Value, XmergeError> {
    let document = load_document(file, input)?;
    Ok(flatten(&document))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension_in_auto_mode() {
        assert_eq!(
            resolve_format(Path::new("a.TOML"), DocumentFormat::Auto),
            DocumentFormat::Toml
        );
        assert_eq!(
            resolve_format(Path::new("a.json"), DocumentFormat::Auto),
            DocumentFormat::Json
        );
        assert_eq!(
            resolve_format(Path::new("a"), DocumentFormat::Auto),
            DocumentFormat::Json
        );
        assert_eq!(
            resolve_format(Path::new("a.json"), DocumentFormat::Toml),
            DocumentFormat::Toml
        );
    }

    #[test]
    fn empty_marker_disables_removal() {
        assert_eq!(
            InputOptions::new(DocumentFormat::Auto, "").import,
            ImportOptions::default()
        );
        assert_eq!(
            InputOptions::new(DocumentFormat::Auto, "!delete")
                .import
                .remove_marker
                .as_deref(),
            Some("!delete")
        );
    }

    #[test]
    fn bare_output_filename_uses_current_directory() {
        let resolved = validate_output_path(Path::new("out.json")).expect("resolve");
        assert_eq!(resolved.file_name().and_then(|n| n.to_str()), Some("out.json"));
    }
}
