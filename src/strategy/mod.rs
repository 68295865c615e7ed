//! Operation strategies: how a computed value becomes a final value or side
//! effect, above the per-kind handlers.

pub mod assignment;
pub mod document_ops;
pub mod method_call;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::context::EvaluationContext;
use crate::error::OperationError;
use crate::model::{Container, Operation};

pub use assignment::BusinessDataAssignmentStrategy;
pub use document_ops::DocumentOperationExecutorStrategy;
pub use method_call::BusinessDataMethodStrategy;

pub trait OperationStrategy: Send + Sync {
    /// Dispatch tag for the strategy registry.
    fn operation_type(&self) -> &'static str;

    /// Turn the evaluated value into the final value, performing any side
    /// effects the operation type implies. `should_persist` is false for
    /// read-only evaluation paths, where the raw value passes through.
    fn compute(
        &self,
        operation: &Operation,
        value: Value,
        container: Container,
        ctx: &EvaluationContext,
        should_persist: bool,
    ) -> Result<Value, OperationError>;
}

/// Registry of strategies by operation type, built at startup.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<&'static str, Arc<dyn OperationStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, strategy: Arc<dyn OperationStrategy>) -> Result<(), OperationError> {
        let operation_type = strategy.operation_type();
        if self.strategies.contains_key(operation_type) {
            return Err(OperationError::StrategyAlreadyRegistered(operation_type));
        }
        self.strategies.insert(operation_type, strategy);
        Ok(())
    }

    pub fn get(&self, operation_type: &str) -> Option<Arc<dyn OperationStrategy>> {
        self.strategies.get(operation_type).cloned()
    }

    pub fn strategy_for(
        &self,
        operation_type: &str,
    ) -> Result<Arc<dyn OperationStrategy>, OperationError> {
        self.get(operation_type)
            .ok_or_else(|| OperationError::StrategyNotFound(operation_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PassThrough;

    impl OperationStrategy for PassThrough {
        fn operation_type(&self) -> &'static str {
            "ASSIGNMENT"
        }

        fn compute(
            &self,
            _operation: &Operation,
            value: Value,
            _container: Container,
            _ctx: &EvaluationContext,
            _should_persist: bool,
        ) -> Result<Value, OperationError> {
            Ok(value)
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = StrategyRegistry::new();
        registry.register(Arc::new(PassThrough)).unwrap();
        assert!(registry.get("ASSIGNMENT").is_some());
        let err = registry
            .strategy_for("DOCUMENT_CREATE_UPDATE")
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, OperationError::StrategyNotFound(_)));
    }

    #[test]
    fn test_double_registration_fails() {
        let mut registry = StrategyRegistry::new();
        registry.register(Arc::new(PassThrough)).unwrap();
        let err = registry.register(Arc::new(PassThrough)).unwrap_err();
        assert!(matches!(
            err,
            OperationError::StrategyAlreadyRegistered("ASSIGNMENT")
        ));
    }
}
