//! Method-call strategy: setter-style operations on business data.

use std::sync::Arc;

use serde_json::Value;

use crate::context::EvaluationContext;
use crate::error::OperationError;
use crate::model::{Container, OperandKind, Operation};
use crate::services::BusinessMethodInvoker;
use crate::strategy::OperationStrategy;

/// Dispatches method-call operations on business-data operands to the domain
/// method invoker; anything else falls through to the generic method
/// strategy. "Is business data" is purely the operand's declared kind.
pub struct BusinessDataMethodStrategy {
    invoker: Arc<dyn BusinessMethodInvoker>,
    fallback: Arc<dyn OperationStrategy>,
}

impl BusinessDataMethodStrategy {
    pub fn new(
        invoker: Arc<dyn BusinessMethodInvoker>,
        fallback: Arc<dyn OperationStrategy>,
    ) -> Self {
        Self { invoker, fallback }
    }
}

impl OperationStrategy for BusinessDataMethodStrategy {
    fn operation_type(&self) -> &'static str {
        "METHOD_CALL"
    }

    fn compute(
        &self,
        operation: &Operation,
        value: Value,
        container: Container,
        ctx: &EvaluationContext,
        should_persist: bool,
    ) -> Result<Value, OperationError> {
        if operation.left_operand.kind() != OperandKind::BusinessData {
            return self
                .fallback
                .compute(operation, value, container, ctx, should_persist);
        }

        let name = operation.left_operand.name();
        let target = ctx
            .get(&operation.left_operand.cache_key())
            .or_else(|| ctx.get(name))
            .ok_or_else(|| OperationError::VariableNotFound(name.to_string()))?;
        self.invoker
            .invoke(
                target,
                &operation.operator,
                &value,
                operation.operator_input_type.as_deref(),
            )
            .map_err(|source| OperationError::MethodInvocation {
                method: operation.operator.clone(),
                reason: source.to_string(),
            })
    }
}
