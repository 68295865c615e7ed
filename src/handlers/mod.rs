//! Left-operand handlers, one per variable kind, dispatched by a registry
//! built at startup.

pub mod business_data;
pub mod data;
pub mod document;
pub mod document_list;
pub mod search_index;
pub mod transient_data;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::context::EvaluationContext;
use crate::error::OperationError;
use crate::model::{Container, ContainerType, LeftOperand, OperandKind};
use crate::services::{OperationServices, ProcessReadService};

pub use business_data::BusinessDataLeftOperandHandler;
pub use data::DataLeftOperandHandler;
pub use document::DocumentLeftOperandHandler;
pub use document_list::DocumentListLeftOperandHandler;
pub use search_index::StringIndexLeftOperandHandler;
pub use transient_data::TransientDataLeftOperandHandler;

/// Uniform contract for reading and mutating one kind of process state.
///
/// Handlers are stateless and thread-confined per invocation; they never
/// retain operands or containers across calls.
pub trait LeftOperandHandler: Send + Sync {
    /// The kind this handler serves.
    fn kind(&self) -> OperandKind;

    /// Read the current value (and any backing record the handler needs) into
    /// the evaluation context. The bare variable name is first-writer wins;
    /// the operand's private cache key is always refreshed.
    fn load_into_context(
        &self,
        operand: &LeftOperand,
        container: Container,
        ctx: &mut EvaluationContext,
    ) -> Result<(), OperationError>;

    /// Apply `new_value`, returning the effective value actually stored. Must
    /// reuse a backing record already present under the private cache key
    /// instead of re-reading it.
    fn update(
        &self,
        operand: &LeftOperand,
        input_values: &EvaluationContext,
        new_value: Value,
        container: Container,
    ) -> Result<Value, OperationError>;

    /// Delete the variable. Only kinds that support deletion override this;
    /// the default fails explicitly, it never silently no-ops.
    fn delete(
        &self,
        _operand: &LeftOperand,
        _container: Container,
    ) -> Result<(), OperationError> {
        Err(OperationError::DeleteNotSupported { kind: self.kind() })
    }
}

/// Registry mapping kind to handler. Exactly one handler per kind; double
/// registration is a startup error.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<OperandKind, Arc<dyn LeftOperandHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn LeftOperandHandler>) -> Result<(), OperationError> {
        let kind = handler.kind();
        if self.handlers.contains_key(&kind) {
            return Err(OperationError::HandlerAlreadyRegistered(kind));
        }
        self.insert(handler);
        Ok(())
    }

    fn insert(&mut self, handler: Arc<dyn LeftOperandHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, kind: OperandKind) -> Option<Arc<dyn LeftOperandHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn handler_for(
        &self,
        kind: OperandKind,
    ) -> Result<Arc<dyn LeftOperandHandler>, OperationError> {
        self.get(kind).ok_or(OperationError::HandlerNotFound(kind))
    }

    pub fn registered_kinds(&self) -> Vec<OperandKind> {
        self.handlers.keys().copied().collect()
    }

    /// Build the standard registry with all six handlers wired to the given
    /// services.
    pub fn standard(services: &OperationServices) -> Self {
        let mut registry = HandlerRegistry::new();
        let wired: [Arc<dyn LeftOperandHandler>; 6] = [
            Arc::new(DataLeftOperandHandler::new(services.data.clone())),
            Arc::new(TransientDataLeftOperandHandler::new(
                services.transient_data.clone(),
            )),
            Arc::new(BusinessDataLeftOperandHandler::new(
                services.repository.clone(),
                services.refs.clone(),
                services.entity_types.clone(),
            )),
            Arc::new(DocumentLeftOperandHandler::new(
                services.documents.clone(),
                services.process.clone(),
                services.session.clone(),
            )),
            Arc::new(DocumentListLeftOperandHandler::new(
                services.documents.clone(),
                services.process.clone(),
            )),
            Arc::new(StringIndexLeftOperandHandler::new(services.process.clone())),
        ];
        for handler in wired {
            registry.insert(handler);
        }
        registry
    }
}

/// Walk from a container to the process instance that owns its documents and
/// search keys.
pub(crate) fn owning_process_instance_id(
    process: &dyn ProcessReadService,
    container: Container,
) -> Result<i64, OperationError> {
    match container.container_type {
        ContainerType::ProcessInstance => Ok(container.id),
        ContainerType::FlowNodeInstance => process
            .flow_node_instance(container.id)
            .map(|fni| fni.parent_process_instance_id)
            .map_err(|source| OperationError::Read {
                what: "flow node instance",
                name: container.id.to_string(),
                source,
            }),
    }
}
