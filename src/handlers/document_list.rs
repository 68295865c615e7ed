//! Handler for document lists.

use std::sync::Arc;

use serde_json::Value;

use crate::context::EvaluationContext;
use crate::error::OperationError;
use crate::handlers::{owning_process_instance_id, LeftOperandHandler};
use crate::model::{Container, DocumentValue, LeftOperand, OperandKind};
use crate::services::{DocumentService, ProcessReadService};

/// Replaces the full document-list association of a variable. Set semantics,
/// not merge: whatever list is assigned becomes the association, and an empty
/// list clears it.
pub struct DocumentListLeftOperandHandler {
    documents: Arc<dyn DocumentService>,
    process: Arc<dyn ProcessReadService>,
}

impl DocumentListLeftOperandHandler {
    pub fn new(documents: Arc<dyn DocumentService>, process: Arc<dyn ProcessReadService>) -> Self {
        Self { documents, process }
    }

    fn parse_list(name: &str, value: &Value) -> Result<Vec<DocumentValue>, OperationError> {
        let Value::Array(items) = value else {
            return Err(OperationError::InvalidDocumentValue {
                name: name.to_string(),
                reason: "a document list must be a list of document values".to_string(),
            });
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                DocumentValue::parse(name, item).map_err(|_| {
                    OperationError::InvalidDocumentValue {
                        name: name.to_string(),
                        reason: format!("element {index} is not a document value"),
                    }
                })
            })
            .collect()
    }
}

impl LeftOperandHandler for DocumentListLeftOperandHandler {
    fn kind(&self) -> OperandKind {
        OperandKind::DocumentList
    }

    fn load_into_context(
        &self,
        operand: &LeftOperand,
        container: Container,
        ctx: &mut EvaluationContext,
    ) -> Result<(), OperationError> {
        let process_instance_id = owning_process_instance_id(self.process.as_ref(), container)?;
        let documents = self
            .documents
            .document_list(process_instance_id, operand.name())
            .map_err(|source| OperationError::Read {
                what: "document list",
                name: operand.name().to_string(),
                source,
            })?;
        let rows = serde_json::to_value(&documents)
            .map_err(|e| OperationError::Internal(format!("cannot serialize documents: {e}")))?;
        ctx.insert(operand.cache_key(), rows.clone());
        ctx.insert_if_absent(operand.name(), rows);
        Ok(())
    }

    fn update(
        &self,
        operand: &LeftOperand,
        _input_values: &EvaluationContext,
        new_value: Value,
        container: Container,
    ) -> Result<Value, OperationError> {
        let process_instance_id = owning_process_instance_id(self.process.as_ref(), container)?;
        let documents = Self::parse_list(operand.name(), &new_value)?;
        self.documents
            .set_document_list(process_instance_id, operand.name(), documents)
            .map_err(|source| OperationError::Write {
                what: "document list",
                name: operand.name().to_string(),
                source,
            })?;
        Ok(new_value)
    }
}
