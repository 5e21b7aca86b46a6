//! Error types for parsing, storage and export.
//!
//! Library modules return these typed errors; the command-line layer wraps
//! them in `anyhow` with context.

use thiserror::Error;

/// A rich-text fragment that cannot be read as a single element tree.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed markup: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("markup contains no element")]
    Empty,

    #[error("markup has more than one root element (found <{0}> after the root)")]
    MultipleRoots(String),

    #[error("text outside the root element: {0:?}")]
    TextOutsideRoot(String),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("unknown entity reference &{0};")]
    UnknownEntity(String),

    #[error("invalid attribute value: {0}")]
    AttributeValue(String),
}

/// Failures of the JSON-file store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot derive fields for entry: {0}")]
    Derivation(#[from] ParseError),

    #[error("a {kind} named {name:?} already exists")]
    Duplicate { kind: &'static str, name: String },

    #[error("{field} is longer than {max} characters: {value:?}")]
    TooLong {
        field: &'static str,
        max: usize,
        value: String,
    },

    #[error("no {kind} named {name:?}")]
    UnknownName { kind: &'static str, name: String },

    #[error("no entry with id {0}")]
    UnknownEntry(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the batch export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("TEI of entry {id} is not well-formed: {source}")]
    MalformedEntry {
        id: u64,
        #[source]
        source: ParseError,
    },

    #[error("exported bibliography is not well-formed: {0}")]
    Malformed(#[source] ParseError),
}
