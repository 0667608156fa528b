//! Operation sources.
//!
//! The dispatcher only ever sees an ordered `Vec<OperationDescriptor>`;
//! these types are the ways of producing one.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::descriptor::document::{ApiDocument, OperationDescriptor};

/// Errors raised while reading an operation source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON API document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML API document: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Supplies operation descriptors once, in registration order.
pub trait OperationSource: Send + Sync {
    fn operations(&self) -> Result<Vec<OperationDescriptor>, SourceError>;
}

/// Descriptors held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    operations: Vec<OperationDescriptor>,
}

impl StaticSource {
    pub fn new(operations: Vec<OperationDescriptor>) -> Self {
        Self { operations }
    }
}

impl From<ApiDocument> for StaticSource {
    fn from(document: ApiDocument) -> Self {
        Self::new(document.operations)
    }
}

impl OperationSource for StaticSource {
    fn operations(&self) -> Result<Vec<OperationDescriptor>, SourceError> {
        Ok(self.operations.clone())
    }
}

/// An API document on disk. `.toml` files are parsed as TOML, anything
/// else as JSON.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    path: PathBuf,
}

impl DocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole document.
    pub fn load(&self) -> Result<ApiDocument, SourceError> {
        let content = fs::read_to_string(&self.path).map_err(|e| SourceError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        parse_document(&content, is_toml(&self.path))
    }
}

impl OperationSource for DocumentSource {
    fn operations(&self) -> Result<Vec<OperationDescriptor>, SourceError> {
        Ok(self.load()?.operations)
    }
}

/// Parse document text in the given format.
pub fn parse_document(content: &str, toml_format: bool) -> Result<ApiDocument, SourceError> {
    if toml_format {
        Ok(toml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("toml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC: &str = r#"{
        "operations": [
            { "method": "GET", "path": "/a", "handler": { "service": "s", "method": "a" } },
            { "method": "GET", "path": "/b", "handler": { "service": "s", "method": "b" } }
        ]
    }"#;

    #[test]
    fn test_document_source_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();

        let source = DocumentSource::new(file.path());
        let ops = source.operations().unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].path, "/a");
        assert_eq!(ops[1].path, "/b");
    }

    #[test]
    fn test_document_source_missing_file() {
        let source = DocumentSource::new("/definitely/not/here.json");
        assert!(matches!(source.operations(), Err(SourceError::Io { .. })));
    }

    #[test]
    fn test_document_source_invalid_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"{ not json").unwrap();

        let source = DocumentSource::new(file.path());
        assert!(matches!(source.operations(), Err(SourceError::Json(_))));
    }

    #[test]
    fn test_static_source_preserves_order() {
        let doc = parse_document(DOC, false).unwrap();
        let source = StaticSource::from(doc);
        let ops = source.operations().unwrap();
        assert_eq!(ops[0].handler.method, "a");
        assert_eq!(ops[1].handler.method, "b");
    }
}
