//! Handler for plain process data.
//!
//! The transient-data handler shares the same load and update path against a
//! different store, so the mechanics live in free functions here.

use std::sync::Arc;

use serde_json::Value;

use crate::context::EvaluationContext;
use crate::error::OperationError;
use crate::handlers::LeftOperandHandler;
use crate::model::{json_type_name, Container, DataInstance, LeftOperand, OperandKind};
use crate::services::DataInstanceStore;

pub struct DataLeftOperandHandler {
    store: Arc<dyn DataInstanceStore>,
}

impl DataLeftOperandHandler {
    pub fn new(store: Arc<dyn DataInstanceStore>) -> Self {
        Self { store }
    }
}

impl LeftOperandHandler for DataLeftOperandHandler {
    fn kind(&self) -> OperandKind {
        OperandKind::Data
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
        apply_data_update(self.store.as_ref(), operand, input_values, new_value, container)
    }
}

/// Read the data row, cache it under the operand's private key and expose its
/// value under the bare name (first writer wins).
pub(crate) fn load_data_instance(
    store: &dyn DataInstanceStore,
    operand: &LeftOperand,
    container: Container,
    ctx: &mut EvaluationContext,
) -> Result<(), OperationError> {
    let instance = read_instance(store, operand, container)?;
    let row = serde_json::to_value(&instance)
        .map_err(|e| OperationError::Internal(format!("cannot serialize data row: {e}")))?;
    ctx.insert(operand.cache_key(), row);
    ctx.insert_if_absent(operand.name(), instance.value);
    Ok(())
}

/// Update the row, taking it from the evaluation context when a load already
/// fetched it in this batch.
pub(crate) fn apply_data_update(
    store: &dyn DataInstanceStore,
    operand: &LeftOperand,
    input_values: &EvaluationContext,
    new_value: Value,
    container: Container,
) -> Result<Value, OperationError> {
    let instance = match input_values.get(&operand.cache_key()) {
        Some(cached) => serde_json::from_value(cached.clone())
            .map_err(|e| OperationError::Internal(format!("corrupt cached data row: {e}")))?,
        None => read_instance(store, operand, container)?,
    };
    check_assignable(operand.name(), &instance.value, &new_value)?;
    store
        .update_data_instance(&instance, new_value.clone())
        .map_err(|source| OperationError::Write {
            what: "data instance",
            name: operand.name().to_string(),
            source,
        })?;
    Ok(new_value)
}

fn read_instance(
    store: &dyn DataInstanceStore,
    operand: &LeftOperand,
    container: Container,
) -> Result<DataInstance, OperationError> {
    store
        .data_instance(operand.name(), container.id, container.container_type)
        .map_err(|source| OperationError::Read {
            what: "data instance",
            name: operand.name().to_string(),
            source,
        })
}

/// Overwriting is only allowed when the new runtime type fits the old one.
/// Null on either side never triggers the check.
fn check_assignable(name: &str, old: &Value, new: &Value) -> Result<(), OperationError> {
    if old.is_null() || new.is_null() {
        return Ok(());
    }
    let expected = json_type_name(old);
    let actual = json_type_name(new);
    let compatible = expected == actual || (expected == "Float" && actual == "Integer");
    if compatible {
        Ok(())
    } else {
        Err(OperationError::IncompatibleType {
            name: name.to_string(),
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::model::ContainerType;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub(crate) struct FakeDataStore {
        rows: Mutex<HashMap<String, DataInstance>>,
        pub reads: AtomicUsize,
        pub writes: AtomicUsize,
    }

    impl FakeDataStore {
        pub(crate) fn with_row(instance: DataInstance) -> Self {
            let mut rows = HashMap::new();
            rows.insert(instance.name.clone(), instance);
            Self {
                rows: Mutex::new(rows),
                reads: AtomicUsize::new(0),
                writes: AtomicUsize::new(0),
            }
        }
    }

    impl DataInstanceStore for FakeDataStore {
        fn data_instance(
            &self,
            name: &str,
            _container_id: i64,
            _container_type: ContainerType,
        ) -> Result<DataInstance, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.rows
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or(StoreError::NotFound {
                    entity: "data instance",
                    id: name.to_string(),
                })
        }

        fn update_data_instance(
            &self,
            instance: &DataInstance,
            new_value: Value,
        ) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .get_mut(&instance.name)
                .ok_or(StoreError::NotFound {
                    entity: "data instance",
                    id: instance.name.clone(),
                })?;
            row.value = new_value;
            Ok(())
        }
    }

    fn amount_row() -> DataInstance {
        DataInstance::new("amount", json!(100), Container::process_instance(42))
    }

    #[test]
    fn test_load_populates_cache_key_and_bare_name() {
        let store = FakeDataStore::with_row(amount_row());
        let handler = DataLeftOperandHandler::new(Arc::new(store));
        let operand = LeftOperand::new("amount", OperandKind::Data);
        let mut ctx = EvaluationContext::new(Container::process_instance(42));

        handler
            .load_into_context(&operand, Container::process_instance(42), &mut ctx)
            .unwrap();
        assert_eq!(ctx.get("amount"), Some(&json!(100)));
        assert!(ctx.is_loaded(&operand.cache_key()));
    }

    #[test]
    fn test_load_does_not_overwrite_bare_name() {
        let store = FakeDataStore::with_row(amount_row());
        let handler = DataLeftOperandHandler::new(Arc::new(store));
        let operand = LeftOperand::new("amount", OperandKind::Data);
        let mut ctx = EvaluationContext::new(Container::process_instance(42));
        ctx.insert_if_absent("amount", json!(5));

        handler
            .load_into_context(&operand, Container::process_instance(42), &mut ctx)
            .unwrap();
        assert_eq!(ctx.get("amount"), Some(&json!(5)));
    }

    #[test]
    fn test_update_uses_cached_row_without_re_reading() {
        let store = Arc::new(FakeDataStore::with_row(amount_row()));
        let handler = DataLeftOperandHandler::new(store.clone());
        let operand = LeftOperand::new("amount", OperandKind::Data);
        let mut ctx = EvaluationContext::new(Container::process_instance(42));

        handler
            .load_into_context(&operand, Container::process_instance(42), &mut ctx)
            .unwrap();
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);

        let stored = handler
            .update(&operand, &ctx, json!(150), Container::process_instance(42))
            .unwrap();
        assert_eq!(stored, json!(150));
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_update_without_preload_reads_once() {
        let store = Arc::new(FakeDataStore::with_row(amount_row()));
        let handler = DataLeftOperandHandler::new(store.clone());
        let operand = LeftOperand::new("amount", OperandKind::Data);
        let ctx = EvaluationContext::new(Container::process_instance(42));

        handler
            .update(&operand, &ctx, json!(150), Container::process_instance(42))
            .unwrap();
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_incompatible_type_names_both_types_and_variable() {
        let store = FakeDataStore::with_row(DataInstance::new(
            "label",
            json!("open"),
            Container::process_instance(42),
        ));
        let handler = DataLeftOperandHandler::new(Arc::new(store));
        let operand = LeftOperand::new("label", OperandKind::Data);
        let ctx = EvaluationContext::new(Container::process_instance(42));

        let err = handler
            .update(&operand, &ctx, json!(3), Container::process_instance(42))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("label"));
        assert!(msg.contains("String"));
        assert!(msg.contains("Integer"));
    }

    #[test]
    fn test_null_assignment_skips_type_check() {
        let store = Arc::new(FakeDataStore::with_row(amount_row()));
        let handler = DataLeftOperandHandler::new(store.clone());
        let operand = LeftOperand::new("amount", OperandKind::Data);
        let ctx = EvaluationContext::new(Container::process_instance(42));

        handler
            .update(&operand, &ctx, Value::Null, Container::process_instance(42))
            .unwrap();
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_integer_fits_float() {
        assert!(check_assignable("rate", &json!(1.5), &json!(2)).is_ok());
        assert!(check_assignable("count", &json!(2), &json!(1.5)).is_err());
    }

    #[test]
    fn test_missing_row_surfaces_read_error() {
        let store = FakeDataStore::with_row(amount_row());
        let handler = DataLeftOperandHandler::new(Arc::new(store));
        let operand = LeftOperand::new("missing", OperandKind::Data);
        let mut ctx = EvaluationContext::new(Container::process_instance(42));

        let err = handler
            .load_into_context(&operand, Container::process_instance(42), &mut ctx)
            .unwrap_err();
        assert!(matches!(err, OperationError::Read { .. }));
    }

    #[test]
    fn test_delete_is_unsupported() {
        let store = FakeDataStore::with_row(amount_row());
        let handler = DataLeftOperandHandler::new(Arc::new(store));
        let operand = LeftOperand::new("amount", OperandKind::Data);
        let err = handler
            .delete(&operand, Container::process_instance(42))
            .unwrap_err();
        assert!(matches!(
            err,
            OperationError::DeleteNotSupported {
                kind: OperandKind::Data
            }
        ));
    }
}
