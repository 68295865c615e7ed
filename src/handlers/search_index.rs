//! Handler for the denormalized string-index search fields.

use std::sync::Arc;

use serde_json::Value;

use crate::context::EvaluationContext;
use crate::error::OperationError;
use crate::handlers::{owning_process_instance_id, LeftOperandHandler};
use crate::model::{json_type_name, Container, LeftOperand, OperandKind};
use crate::services::{CallerType, ProcessReadService};

const SLOT_MIN: u8 = 1;
const SLOT_MAX: u8 = 5;

/// Writes one of the five search-key slots on the owning process instance.
///
/// The operand name is the slot number. When the owning process was started
/// by a sub-process the slot lives on the caller's process instance, exactly
/// one hop up.
pub struct StringIndexLeftOperandHandler {
    process: Arc<dyn ProcessReadService>,
}

impl StringIndexLeftOperandHandler {
    pub fn new(process: Arc<dyn ProcessReadService>) -> Self {
        Self { process }
    }

    fn parse_slot(operand: &LeftOperand) -> Result<u8, OperationError> {
        operand
            .name()
            .parse::<u8>()
            .ok()
            .filter(|slot| (SLOT_MIN..=SLOT_MAX).contains(slot))
            .ok_or_else(|| OperationError::SearchIndexOutOfRange(operand.name().to_string()))
    }

    fn parse_value(value: &Value) -> Result<Option<String>, OperationError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            other => Err(OperationError::SearchIndexNotAString {
                actual: json_type_name(other),
            }),
        }
    }

    fn target_process_instance(&self, container: Container) -> Result<i64, OperationError> {
        let id = owning_process_instance_id(self.process.as_ref(), container)?;
        let instance = self
            .process
            .process_instance(id)
            .map_err(|source| OperationError::Read {
                what: "process instance",
                name: id.to_string(),
                source,
            })?;
        if instance.caller_type != CallerType::SubProcess {
            return Ok(instance.id);
        }
        // A sub-process writes the search keys of the process that spawned
        // it: follow the caller flow node to its parent, one hop only.
        let caller_id = instance
            .caller_id
            .ok_or_else(|| OperationError::Internal("sub-process without caller id".to_string()))?;
        let caller = self
            .process
            .flow_node_instance(caller_id)
            .map_err(|source| OperationError::Read {
                what: "caller flow node instance",
                name: caller_id.to_string(),
                source,
            })?;
        Ok(caller.parent_process_instance_id)
    }
}

impl LeftOperandHandler for StringIndexLeftOperandHandler {
    fn kind(&self) -> OperandKind {
        OperandKind::SearchIndex
    }

    /// Search keys are write-only from the operation side; there is nothing
    /// to pre-load for expression evaluation.
    fn load_into_context(
        &self,
        _operand: &LeftOperand,
        _container: Container,
        _ctx: &mut EvaluationContext,
    ) -> Result<(), OperationError> {
        Ok(())
    }

    fn update(
        &self,
        operand: &LeftOperand,
        _input_values: &EvaluationContext,
        new_value: Value,
        container: Container,
    ) -> Result<Value, OperationError> {
        let slot = Self::parse_slot(operand)?;
        let value = Self::parse_value(&new_value)?;
        let process_instance_id = self.target_process_instance(container)?;
        self.process
            .update_search_key(process_instance_id, slot, value)
            .map_err(|source| OperationError::Write {
                what: "search key",
                name: operand.name().to_string(),
                source,
            })?;
        Ok(new_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::services::{FlowNodeInstance, ProcessInstance};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeProcess {
        instances: HashMap<i64, ProcessInstance>,
        flow_nodes: HashMap<i64, FlowNodeInstance>,
        written: Mutex<Vec<(i64, u8, Option<String>)>>,
    }

    impl FakeProcess {
        fn plain(process_instance_id: i64) -> Self {
            let mut instances = HashMap::new();
            instances.insert(
                process_instance_id,
                ProcessInstance {
                    id: process_instance_id,
                    caller_id: None,
                    caller_type: CallerType::None,
                },
            );
            Self {
                instances,
                flow_nodes: HashMap::new(),
                written: Mutex::new(Vec::new()),
            }
        }
    }

    impl ProcessReadService for FakeProcess {
        fn flow_node_instance(&self, id: i64) -> Result<FlowNodeInstance, StoreError> {
            self.flow_nodes
                .get(&id)
                .cloned()
                .ok_or(StoreError::NotFound {
                    entity: "flow node instance",
                    id: id.to_string(),
                })
        }

        fn process_instance(&self, id: i64) -> Result<ProcessInstance, StoreError> {
            self.instances
                .get(&id)
                .cloned()
                .ok_or(StoreError::NotFound {
                    entity: "process instance",
                    id: id.to_string(),
                })
        }

        fn update_search_key(
            &self,
            process_instance_id: i64,
            slot: u8,
            value: Option<String>,
        ) -> Result<(), StoreError> {
            self.written
                .lock()
                .unwrap()
                .push((process_instance_id, slot, value));
            Ok(())
        }
    }

    fn operand(name: &str) -> LeftOperand {
        LeftOperand::new(name, OperandKind::SearchIndex)
    }

    #[test]
    fn test_slots_one_to_five_accept_strings_and_null() {
        let process = Arc::new(FakeProcess::plain(42));
        let handler = StringIndexLeftOperandHandler::new(process.clone());
        let ctx = EvaluationContext::new(Container::process_instance(42));

        for slot in 1..=5u8 {
            handler
                .update(
                    &operand(&slot.to_string()),
                    &ctx,
                    json!("customer-123"),
                    Container::process_instance(42),
                )
                .unwrap();
            handler
                .update(
                    &operand(&slot.to_string()),
                    &ctx,
                    Value::Null,
                    Container::process_instance(42),
                )
                .unwrap();
        }
        assert_eq!(process.written.lock().unwrap().len(), 10);
    }

    #[test]
    fn test_slot_zero_and_six_are_out_of_range() {
        let process = Arc::new(FakeProcess::plain(42));
        let handler = StringIndexLeftOperandHandler::new(process);
        let ctx = EvaluationContext::new(Container::process_instance(42));

        for name in ["0", "6", "abc"] {
            let err = handler
                .update(
                    &operand(name),
                    &ctx,
                    json!("x"),
                    Container::process_instance(42),
                )
                .unwrap_err();
            assert!(matches!(err, OperationError::SearchIndexOutOfRange(_)));
        }
    }

    #[test]
    fn test_non_string_value_is_rejected() {
        let process = Arc::new(FakeProcess::plain(42));
        let handler = StringIndexLeftOperandHandler::new(process);
        let ctx = EvaluationContext::new(Container::process_instance(42));

        let err = handler
            .update(
                &operand("2"),
                &ctx,
                json!(17),
                Container::process_instance(42),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            OperationError::SearchIndexNotAString { actual: "Integer" }
        ));
    }

    #[test]
    fn test_sub_process_hops_to_caller_process() {
        let mut process = FakeProcess::plain(100);
        process.instances.insert(
            42,
            ProcessInstance {
                id: 42,
                caller_id: Some(9),
                caller_type: CallerType::SubProcess,
            },
        );
        process.flow_nodes.insert(
            9,
            FlowNodeInstance {
                id: 9,
                parent_process_instance_id: 100,
                root_container_id: 100,
            },
        );
        let process = Arc::new(process);
        let handler = StringIndexLeftOperandHandler::new(process.clone());
        let ctx = EvaluationContext::new(Container::process_instance(42));

        handler
            .update(
                &operand("1"),
                &ctx,
                json!("order-55"),
                Container::process_instance(42),
            )
            .unwrap();
        let written = process.written.lock().unwrap();
        assert_eq!(written[0], (100, 1, Some("order-55".to_string())));
    }

    #[test]
    fn test_delete_is_unsupported() {
        let process = Arc::new(FakeProcess::plain(42));
        let handler = StringIndexLeftOperandHandler::new(process);
        let err = handler
            .delete(&operand("1"), Container::process_instance(42))
            .unwrap_err();
        assert!(matches!(
            err,
            OperationError::DeleteNotSupported {
                kind: OperandKind::SearchIndex
            }
        ));
    }
}
