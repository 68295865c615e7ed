//! Document values as produced by the expression evaluator, and the stored
//! document row shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OperationError;

/// A document value constructed by the expression evaluator and consumed
/// exactly once by the document handler or strategy.
///
/// `has_changed == false` together with a non-null `document_id` marks a
/// re-assignment of an unmodified document; such an update is a no-op.
///
/// Unknown fields are rejected: an arbitrary object (a business entity, a
/// stored document row) must not pass for a document value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DocumentValue {
    #[serde(default)]
    pub has_content: bool,
    #[serde(default)]
    pub content: Option<Vec<u8>>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub document_id: Option<i64>,
    #[serde(default)]
    pub has_changed: bool,
}

impl DocumentValue {
    pub fn with_content(
        content: Vec<u8>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            has_content: true,
            content: Some(content),
            file_name: Some(file_name.into()),
            mime_type: Some(mime_type.into()),
            ..Default::default()
        }
    }

    pub fn external(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Parse a runtime value into a document value, naming the variable in
    /// the error when the shape does not fit.
    pub fn parse(name: &str, value: &Value) -> Result<Self, OperationError> {
        serde_json::from_value(value.clone()).map_err(|e| OperationError::InvalidDocumentValue {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// True when this value refers to an already-stored, unmodified document.
    pub fn is_unchanged_existing(&self) -> bool {
        self.document_id.is_some() && !self.has_changed
    }
}

/// A stored document row, as returned by the document service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub process_instance_id: i64,
    pub name: String,
    pub author: i64,
    pub creation_date: DateTime<Utc>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub url: Option<String>,
    pub has_content: bool,
}

/// Metadata for a document create or update, stamped with author and creation
/// time by the caller before it reaches the document service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub name: String,
    pub author: i64,
    pub creation_date: DateTime<Utc>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub url: Option<String>,
    pub has_content: bool,
}

impl DocumentRecord {
    pub fn from_value(
        name: impl Into<String>,
        value: &DocumentValue,
        author: i64,
        creation_date: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            author,
            creation_date,
            file_name: value.file_name.clone(),
            mime_type: value.mime_type.clone(),
            url: value.url.clone(),
            has_content: value.has_content,
        }
    }
}
