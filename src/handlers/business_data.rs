//! Handler for business (domain-entity) data.

use std::sync::Arc;

use serde_json::Value;

use crate::context::EvaluationContext;
use crate::entity::{EntitiesActionsExecutor, EntityAction, UpdateDataRefAction};
use crate::error::OperationError;
use crate::handlers::LeftOperandHandler;
use crate::model::{
    BusinessDataContext, BusinessDataRef, Container, EntityTypeRegistry, EntityValue, LeftOperand,
    OperandKind,
};
use crate::services::{BusinessDataRepository, RefStore};

/// Resolves the persisted reference, loads entities by id, and routes updates
/// through the entity-action subsystem.
///
/// A simple reference with no id yet loads as a freshly constructed empty
/// instance of the target type, never as null; expressions downstream can
/// populate it and assign it back.
pub struct BusinessDataLeftOperandHandler {
    repository: Arc<dyn BusinessDataRepository>,
    refs: Arc<dyn RefStore>,
    entity_types: Arc<EntityTypeRegistry>,
    executor: EntitiesActionsExecutor,
}

impl BusinessDataLeftOperandHandler {
    pub fn new(
        repository: Arc<dyn BusinessDataRepository>,
        refs: Arc<dyn RefStore>,
        entity_types: Arc<EntityTypeRegistry>,
    ) -> Self {
        Self {
            repository,
            refs,
            entity_types,
            executor: EntitiesActionsExecutor::new(),
        }
    }

    fn load_ref(&self, context: &BusinessDataContext) -> Result<BusinessDataRef, OperationError> {
        self.refs
            .get_ref(context)
            .map_err(|source| OperationError::Read {
                what: "business data reference",
                name: context.name().to_string(),
                source,
            })
    }

    fn resolve_value(&self, context: &BusinessDataContext) -> Result<Value, OperationError> {
        match self.load_ref(context)? {
            BusinessDataRef::Simple {
                data_id: Some(id),
                type_name,
                ..
            } => {
                let entity =
                    self.repository
                        .find_by_id(&type_name, id)
                        .map_err(|source| OperationError::Read {
                            what: "business data entity",
                            name: context.name().to_string(),
                            source,
                        })?;
                Ok(entity.to_value())
            }
            BusinessDataRef::Simple {
                data_id: None,
                type_name,
                ..
            } => Ok(self.entity_types.new_instance(&type_name)?.to_value()),
            BusinessDataRef::Multi {
                data_ids,
                type_name,
                ..
            } => {
                let entities = self
                    .repository
                    .find_by_ids(&type_name, &data_ids)
                    .map_err(|source| OperationError::Read {
                        what: "business data entities",
                        name: context.name().to_string(),
                        source,
                    })?;
                Ok(Value::Array(
                    entities.iter().map(|e| e.to_value()).collect(),
                ))
            }
        }
    }
}

impl LeftOperandHandler for BusinessDataLeftOperandHandler {
    fn kind(&self) -> OperandKind {
        OperandKind::BusinessData
    }

    fn load_into_context(
        &self,
        operand: &LeftOperand,
        container: Container,
        ctx: &mut EvaluationContext,
    ) -> Result<(), OperationError> {
        let context = BusinessDataContext::new(operand.name(), container);
        let value = self.resolve_value(&context)?;
        ctx.insert(operand.cache_key(), value.clone());
        ctx.insert_if_absent(operand.name(), value);
        Ok(())
    }

    fn update(
        &self,
        operand: &LeftOperand,
        _input_values: &EvaluationContext,
        new_value: Value,
        container: Container,
    ) -> Result<Value, OperationError> {
        let context = BusinessDataContext::new(operand.name(), container);
        let value = EntityValue::from_value(&new_value)?;
        let action = UpdateDataRefAction::new(self.refs.clone());
        let result = self.executor.execute_action(value, &context, &action)?;
        Ok(result.to_value())
    }

    /// Business data is the one deletable kind: remove the referenced
    /// entities, then clear the reference the same way an explicit null
    /// assignment would.
    fn delete(&self, operand: &LeftOperand, container: Container) -> Result<(), OperationError> {
        let context = BusinessDataContext::new(operand.name(), container);
        let remove = |type_name: &str, id: i64| -> Result<(), OperationError> {
            let entity = self
                .repository
                .find_by_id(type_name, id)
                .map_err(|source| OperationError::Read {
                    what: "business data entity",
                    name: context.name().to_string(),
                    source,
                })?;
            self.repository
                .remove(&entity)
                .map_err(|source| OperationError::Write {
                    what: "business data entity",
                    name: context.name().to_string(),
                    source,
                })
        };

        match self.load_ref(&context)? {
            BusinessDataRef::Simple {
                data_id: Some(id),
                type_name,
                ..
            } => remove(&type_name, id)?,
            BusinessDataRef::Simple { data_id: None, .. } => {}
            BusinessDataRef::Multi {
                data_ids,
                type_name,
                ..
            } => {
                for id in data_ids {
                    remove(&type_name, id)?;
                }
            }
        }
        UpdateDataRefAction::new(self.refs.clone()).handle_null(&context)
    }
}
