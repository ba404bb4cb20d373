//! Document JSON format: `{ "version": 1, "elements": [...] }`.

use crate::element::Element;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(u32),
}

/// A serialized whiteboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    pub elements: Vec<Element>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Document {
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            elements,
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a document, rejecting unknown versions.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let doc: Document = serde_json::from_str(json)?;
        if doc.version > DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion(doc.version));
        }
        Ok(doc)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Serialize elements as a document.
pub fn export_to_json(elements: &[Element]) -> String {
    match Document::new(elements.to_vec()).to_json() {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to serialize document: {}", e);
            String::new()
        }
    }
}

/// Parse a document, yielding no elements when the payload is malformed.
pub fn import_from_json(json: &str) -> Vec<Element> {
    match Document::from_json(json) {
        Ok(doc) => doc.elements,
        Err(e) => {
            log::error!("Failed to import document: {}", e);
            Vec::new()
        }
    }
}
