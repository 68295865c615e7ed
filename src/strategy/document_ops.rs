//! Direct-to-service document operation strategy.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::context::EvaluationContext;
use crate::error::OperationError;
use crate::handlers::owning_process_instance_id;
use crate::model::{Container, DocumentRecord, DocumentValue, Operation};
use crate::services::{DocumentService, ProcessReadService, SessionAccessor};
use crate::strategy::OperationStrategy;

/// The non-handler document path: talks to the document service directly.
///
/// Assigning null deletes the current version, tolerating an already-absent
/// document. Otherwise the write branches on content-vs-URL and then on
/// whether a current row exists; all four paths stamp author, creation time
/// and file metadata the same way.
pub struct DocumentOperationExecutorStrategy {
    documents: Arc<dyn DocumentService>,
    process: Arc<dyn ProcessReadService>,
    session: Arc<dyn SessionAccessor>,
}

impl DocumentOperationExecutorStrategy {
    pub fn new(
        documents: Arc<dyn DocumentService>,
        process: Arc<dyn ProcessReadService>,
        session: Arc<dyn SessionAccessor>,
    ) -> Self {
        Self {
            documents,
            process,
            session,
        }
    }

    fn existing_document_id(
        &self,
        process_instance_id: i64,
        name: &str,
    ) -> Result<Option<i64>, OperationError> {
        match self.documents.get_document(process_instance_id, name) {
            Ok(document) => Ok(Some(document.id)),
            Err(source) if source.is_not_found() => Ok(None),
            Err(source) => Err(OperationError::Read {
                what: "document",
                name: name.to_string(),
                source,
            }),
        }
    }
}

impl OperationStrategy for DocumentOperationExecutorStrategy {
    fn operation_type(&self) -> &'static str {
        "DOCUMENT_CREATE_UPDATE"
    }

    fn compute(
        &self,
        operation: &Operation,
        value: Value,
        container: Container,
        _ctx: &EvaluationContext,
        _should_persist: bool,
    ) -> Result<Value, OperationError> {
        let name = operation.left_operand.name();
        let process_instance_id = owning_process_instance_id(self.process.as_ref(), container)?;

        if value.is_null() {
            match self
                .documents
                .remove_current_version(process_instance_id, name)
            {
                Ok(()) => {}
                Err(source) if source.is_not_found() => {
                    debug!(name, "no current document version to remove");
                }
                Err(source) => {
                    return Err(OperationError::Write {
                        what: "document",
                        name: name.to_string(),
                        source,
                    })
                }
            }
            return Ok(Value::Null);
        }

        let document_value = DocumentValue::parse(name, &value)?;
        let author = self
            .session
            .user_id()
            .map_err(|source| OperationError::Read {
                what: "session user",
                name: name.to_string(),
                source,
            })?;
        let record = DocumentRecord::from_value(name, &document_value, author, Utc::now());
        let existing = self.existing_document_id(process_instance_id, name)?;

        let stored = if document_value.has_content {
            let content = document_value.content.as_deref();
            match existing {
                Some(document_id) => self.documents.update_document(document_id, record, content),
                None => self
                    .documents
                    .attach_document(process_instance_id, record, content),
            }
        } else {
            match existing {
                Some(document_id) => self.documents.update_document(document_id, record, None),
                None => self
                    .documents
                    .attach_document(process_instance_id, record, None),
            }
        }
        .map_err(|source| OperationError::Write {
            what: "document",
            name: name.to_string(),
            source,
        })?;

        serde_json::to_value(&stored)
            .map_err(|e| OperationError::Internal(format!("cannot serialize document: {e}")))
    }
}
