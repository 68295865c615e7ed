//! Assignment strategy for business data.

use std::sync::Arc;

use serde_json::Value;

use crate::context::EvaluationContext;
use crate::entity::{EntitiesActionsExecutor, MergeEntityAction};
use crate::error::OperationError;
use crate::model::{BusinessDataContext, Container, EntityValue, Operation};
use crate::services::BusinessDataRepository;
use crate::strategy::OperationStrategy;

/// Merges the computed entities into the repository before the handler
/// rewrites the reference. Read-only evaluation paths (contract checks,
/// expression-only operations) pass the raw value through untouched.
pub struct BusinessDataAssignmentStrategy {
    executor: EntitiesActionsExecutor,
    merge: MergeEntityAction,
}

impl BusinessDataAssignmentStrategy {
    pub fn new(repository: Arc<dyn BusinessDataRepository>) -> Self {
        Self {
            executor: EntitiesActionsExecutor::new(),
            merge: MergeEntityAction::new(repository),
        }
    }
}

impl OperationStrategy for BusinessDataAssignmentStrategy {
    fn operation_type(&self) -> &'static str {
        "ASSIGNMENT"
    }

    fn compute(
        &self,
        operation: &Operation,
        value: Value,
        container: Container,
        _ctx: &EvaluationContext,
        should_persist: bool,
    ) -> Result<Value, OperationError> {
        if !should_persist {
            return Ok(value);
        }
        let context = BusinessDataContext::new(operation.left_operand.name(), container);
        let entity_value = EntityValue::from_value(&value)?;
        let merged = self
            .executor
            .execute_action(entity_value, &context, &self.merge)?;
        Ok(merged.to_value())
    }
}
