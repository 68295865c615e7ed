//! Error types for operation execution.
//!
//! Two levels, mirroring the store/subsystem split: [`StoreError`] is what the
//! consumed services return, [`OperationError`] is what this subsystem
//! surfaces to the invoking engine. Every store failure is wrapped with the
//! name of what was being read or written so the cause chain stays intact.

use thiserror::Error;

use crate::model::OperandKind;

/// Failures reported by the consumed persistence services.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("storage failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Operation-execution errors surfaced to the invoking engine.
///
/// Read failures are always propagated, never retried here. Type and shape
/// mismatches are process-design errors and carry both the expected and the
/// actual side of the mismatch.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("failed to read {what} '{name}'")]
    Read {
        what: &'static str,
        name: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to write {what} '{name}'")]
    Write {
        what: &'static str,
        name: String,
        #[source]
        source: StoreError,
    },
    #[error("incompatible assignment to '{name}': cannot assign a {actual} to a {expected}")]
    IncompatibleType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("the reference '{name}' is a {actual} reference, expected a {expected} reference")]
    RefShapeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("a business data left operand must hold an entity or a list of entities, got {actual}")]
    InvalidBusinessValue { actual: &'static str },
    #[error("the list assigned to '{name}' contains null elements")]
    NullElementInList { name: String },
    #[error("cannot save a null entity")]
    NullEntity,
    #[error("entity of type '{type_name}' has no persistence id")]
    MissingPersistenceId { type_name: String },
    #[error("unknown business data type '{0}'")]
    UnknownEntityType(String),
    #[error("delete is not supported for {kind} left operands")]
    DeleteNotSupported { kind: OperandKind },
    #[error("invalid document value for '{name}': {reason}")]
    InvalidDocumentValue { name: String, reason: String },
    #[error("a search index name must be an integer between 1 and 5, got '{0}'")]
    SearchIndexOutOfRange(String),
    #[error("a search index value must be a string, got {actual}")]
    SearchIndexNotAString { actual: &'static str },
    #[error("no handler registered for {0} left operands")]
    HandlerNotFound(OperandKind),
    #[error("a handler for {0} left operands is already registered")]
    HandlerAlreadyRegistered(OperandKind),
    #[error("no strategy registered for operation type '{0}'")]
    StrategyNotFound(String),
    #[error("a strategy for operation type '{0}' is already registered")]
    StrategyAlreadyRegistered(&'static str),
    #[error("variable '{0}' is not present in the evaluation context")]
    VariableNotFound(String),
    #[error("method invocation '{method}' failed: {reason}")]
    MethodInvocation { method: String, reason: String },
    #[error("internal error: {0}")]
    Internal(String),
}
