//! Handler for single documents.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::context::EvaluationContext;
use crate::error::OperationError;
use crate::handlers::{owning_process_instance_id, LeftOperandHandler};
use crate::model::{Container, Document, DocumentRecord, DocumentValue, LeftOperand, OperandKind};
use crate::services::{DocumentService, ProcessReadService, SessionAccessor};

/// Creates, versions or removes the document a variable points at.
///
/// Assigning null deletes the current version. Re-assigning an unmodified
/// existing document (`document_id` set, `has_changed` false) is a no-op and
/// returns the input unchanged without touching the document service.
pub struct DocumentLeftOperandHandler {
    documents: Arc<dyn DocumentService>,
    process: Arc<dyn ProcessReadService>,
    session: Arc<dyn SessionAccessor>,
}

impl DocumentLeftOperandHandler {
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

    /// Remove the current version; an already-absent document is tolerated,
    /// which is the one place a store error is deliberately swallowed.
    fn remove_current_version(
        &self,
        process_instance_id: i64,
        name: &str,
    ) -> Result<(), OperationError> {
        match self.documents.remove_current_version(process_instance_id, name) {
            Ok(()) => Ok(()),
            Err(source) if source.is_not_found() => {
                debug!(name, "no current document version to remove");
                Ok(())
            }
            Err(source) => Err(OperationError::Write {
                what: "document",
                name: name.to_string(),
                source,
            }),
        }
    }

    /// Current row, taken from the batch cache when the load phase already
    /// fetched it; a missing row means "create" rather than an error.
    fn current_document(
        &self,
        operand: &LeftOperand,
        input_values: &EvaluationContext,
        process_instance_id: i64,
    ) -> Result<Option<Document>, OperationError> {
        if let Some(cached) = input_values.get(&operand.cache_key()) {
            let row = serde_json::from_value(cached.clone())
                .map_err(|e| OperationError::Internal(format!("corrupt cached document: {e}")))?;
            return Ok(Some(row));
        }
        match self.documents.get_document(process_instance_id, operand.name()) {
            Ok(row) => Ok(Some(row)),
            Err(source) if source.is_not_found() => Ok(None),
            Err(source) => Err(OperationError::Read {
                what: "document",
                name: operand.name().to_string(),
                source,
            }),
        }
    }
}

impl LeftOperandHandler for DocumentLeftOperandHandler {
    fn kind(&self) -> OperandKind {
        OperandKind::Document
    }

    fn load_into_context(
        &self,
        operand: &LeftOperand,
        container: Container,
        ctx: &mut EvaluationContext,
    ) -> Result<(), OperationError> {
        let process_instance_id = owning_process_instance_id(self.process.as_ref(), container)?;
        let document = self
            .documents
            .get_document(process_instance_id, operand.name())
            .map_err(|source| OperationError::Read {
                what: "document",
                name: operand.name().to_string(),
                source,
            })?;
        let row = serde_json::to_value(&document)
            .map_err(|e| OperationError::Internal(format!("cannot serialize document: {e}")))?;
        ctx.insert(operand.cache_key(), row.clone());
        ctx.insert_if_absent(operand.name(), row);
        Ok(())
    }

    fn update(
        &self,
        operand: &LeftOperand,
        input_values: &EvaluationContext,
        new_value: Value,
        container: Container,
    ) -> Result<Value, OperationError> {
        let process_instance_id = owning_process_instance_id(self.process.as_ref(), container)?;

        if new_value.is_null() {
            self.remove_current_version(process_instance_id, operand.name())?;
            return Ok(Value::Null);
        }

        let document_value = DocumentValue::parse(operand.name(), &new_value)?;
        if document_value.is_unchanged_existing() {
            debug!(
                name = operand.name(),
                document_id = document_value.document_id,
                "document unchanged, skipping update"
            );
            return Ok(new_value);
        }

        let author = self
            .session
            .user_id()
            .map_err(|source| OperationError::Read {
                what: "session user",
                name: operand.name().to_string(),
                source,
            })?;
        let record = DocumentRecord::from_value(operand.name(), &document_value, author, Utc::now());
        let content = if document_value.has_content {
            document_value.content.as_deref()
        } else {
            None
        };

        let stored = match self.current_document(operand, input_values, process_instance_id)? {
            Some(existing) => self
                .documents
                .update_document(existing.id, record, content),
            None => self
                .documents
                .attach_document(process_instance_id, record, content),
        }
        .map_err(|source| OperationError::Write {
            what: "document",
            name: operand.name().to_string(),
            source,
        })?;

        serde_json::to_value(&stored)
            .map_err(|e| OperationError::Internal(format!("cannot serialize document: {e}")))
    }
}
