//! Handler for transient (non-durable) process data.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::context::EvaluationContext;
use crate::error::OperationError;
use crate::handlers::data::{apply_data_update, load_data_instance};
use crate::handlers::LeftOperandHandler;
use crate::model::{Container, LeftOperand, OperandKind};
use crate::services::DataInstanceStore;

/// Same update path as plain data, against the non-durable store. Every
/// update logs a durability warning: the value is lost on engine restart, and
/// the operator should see that rather than the update silently proceeding.
pub struct TransientDataLeftOperandHandler {
    store: Arc<dyn DataInstanceStore>,
}

impl TransientDataLeftOperandHandler {
    pub fn new(store: Arc<dyn DataInstanceStore>) -> Self {
        Self { store }
    }
}

impl LeftOperandHandler for TransientDataLeftOperandHandler {
    fn kind(&self) -> OperandKind {
        OperandKind::TransientData
    }

    fn load_into_context(
        &self,
        operand: &LeftOperand,
        container: Container,
        ctx: &mut EvaluationContext,
    ) -> Result<(), OperationError> {
        load_data_instance(self.store.as_ref(), operand, container, ctx)
    }

    fn update(
        &self,
        operand: &LeftOperand,
        input_values: &EvaluationContext,
        new_value: Value,
        container: Container,
    ) -> Result<Value, OperationError> {
        warn!(
            name = operand.name(),
            container_id = container.id,
            "updating transient data; the new value will not survive a restart"
        );
        apply_data_update(self.store.as_ref(), operand, input_values, new_value, container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::model::{ContainerType, DataInstance};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct InMemoryStore {
        rows: Mutex<HashMap<String, DataInstance>>,
    }

    impl DataInstanceStore for InMemoryStore {
        fn data_instance(
            &self,
            name: &str,
            _container_id: i64,
            _container_type: ContainerType,
        ) -> Result<DataInstance, StoreError> {
            self.rows
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or(StoreError::NotFound {
                    entity: "transient data instance",
                    id: name.to_string(),
                })
        }

        fn update_data_instance(
            &self,
            instance: &DataInstance,
            new_value: Value,
        ) -> Result<(), StoreError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&instance.name) {
                Some(row) => {
                    row.value = new_value;
                    Ok(())
                }
                None => Err(StoreError::NotFound {
                    entity: "transient data instance",
                    id: instance.name.clone(),
                }),
            }
        }
    }

    #[derive(Clone)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_update_logs_durability_warning() {
        let container = Container::flow_node_instance(7);
        let mut rows = HashMap::new();
        rows.insert(
            "counter".to_string(),
            DataInstance::new("counter", json!(1), container),
        );
        let store = Arc::new(InMemoryStore {
            rows: Mutex::new(rows),
        });
        let handler = TransientDataLeftOperandHandler::new(store);
        let operand = LeftOperand::new("counter", OperandKind::TransientData);
        let ctx = EvaluationContext::new(container);

        let sink = Arc::new(Mutex::new(Vec::new()));
        let writer = CaptureWriter(sink.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            handler.update(&operand, &ctx, json!(2), container).unwrap();
        });

        let logs = String::from_utf8(sink.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("will not survive a restart"));
        assert!(logs.contains("counter"));
    }

    #[test]
    fn test_update_proceeds_despite_durability_risk() {
        let container = Container::flow_node_instance(7);
        let mut rows = HashMap::new();
        rows.insert(
            "counter".to_string(),
            DataInstance::new("counter", json!(1), container),
        );
        let store = Arc::new(InMemoryStore {
            rows: Mutex::new(rows),
        });
        let handler = TransientDataLeftOperandHandler::new(store.clone());
        let operand = LeftOperand::new("counter", OperandKind::TransientData);
        let ctx = EvaluationContext::new(container);

        let stored = handler.update(&operand, &ctx, json!(2), container).unwrap();
        assert_eq!(stored, json!(2));
        assert_eq!(
            store
                .data_instance("counter", 7, ContainerType::FlowNodeInstance)
                .unwrap()
                .value,
            json!(2)
        );
    }

    #[test]
    fn test_type_check_applies_to_transient_data_too() {
        let container = Container::flow_node_instance(7);
        let mut rows = HashMap::new();
        rows.insert(
            "counter".to_string(),
            DataInstance::new("counter", json!(1), container),
        );
        let store = Arc::new(InMemoryStore {
            rows: Mutex::new(rows),
        });
        let handler = TransientDataLeftOperandHandler::new(store);
        let operand = LeftOperand::new("counter", OperandKind::TransientData);
        let ctx = EvaluationContext::new(container);

        let err = handler
            .update(&operand, &ctx, json!("two"), container)
            .unwrap_err();
        assert!(matches!(err, OperationError::IncompatibleType { .. }));
    }

    #[test]
    fn test_delete_is_unsupported() {
        let store = Arc::new(InMemoryStore {
            rows: Mutex::new(HashMap::new()),
        });
        let handler = TransientDataLeftOperandHandler::new(store);
        let operand = LeftOperand::new("counter", OperandKind::TransientData);
        let err = handler
            .delete(&operand, Container::flow_node_instance(7))
            .unwrap_err();
        assert!(matches!(
            err,
            OperationError::DeleteNotSupported {
                kind: OperandKind::TransientData
            }
        ));
    }
}
