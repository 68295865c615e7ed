//! Rewrites the persisted reference after entities have been merged.

use std::sync::Arc;

use crate::entity::EntityAction;
use crate::error::OperationError;
use crate::model::{BusinessDataContext, BusinessDataRef, Entity};
use crate::services::RefStore;

/// Rewrites the stored simple or multi reference from the merged value.
///
/// Shape is never coerced: a single entity against a multi reference (or a
/// list against a simple one) is a hard error. Writes are skipped when the
/// stored ids already match, containment and cardinality both, order aside.
#[derive(Clone)]
pub struct UpdateDataRefAction {
    refs: Arc<dyn RefStore>,
}

impl UpdateDataRefAction {
    pub fn new(refs: Arc<dyn RefStore>) -> Self {
        Self { refs }
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

    fn write_simple(
        &self,
        context: &BusinessDataContext,
        data_id: Option<i64>,
    ) -> Result<(), OperationError> {
        self.refs
            .update_simple_ref(context, data_id)
            .map_err(|source| OperationError::Write {
                what: "business data reference",
                name: context.name().to_string(),
                source,
            })
    }

    fn write_multi(
        &self,
        context: &BusinessDataContext,
        data_ids: Vec<i64>,
    ) -> Result<(), OperationError> {
        self.refs
            .update_multi_ref(context, data_ids)
            .map_err(|source| OperationError::Write {
                what: "business data reference",
                name: context.name().to_string(),
                source,
            })
    }
}

impl EntityAction for UpdateDataRefAction {
    fn execute(
        &self,
        entity: Entity,
        context: &BusinessDataContext,
    ) -> Result<Entity, OperationError> {
        let persisted_id =
            entity
                .persistence_id()
                .ok_or_else(|| OperationError::MissingPersistenceId {
                    type_name: entity.type_name().to_string(),
                })?;
        match self.load_ref(context)? {
            BusinessDataRef::Simple { data_id, .. } => {
                if data_id != Some(persisted_id) {
                    self.write_simple(context, Some(persisted_id))?;
                } else {
                    tracing::debug!(
                        name = context.name(),
                        id = persisted_id,
                        "reference already up to date, skipping write"
                    );
                }
                Ok(entity)
            }
            other @ BusinessDataRef::Multi { .. } => Err(OperationError::RefShapeMismatch {
                name: context.name().to_string(),
                expected: "simple",
                actual: other.shape(),
            }),
        }
    }

    fn execute_list(
        &self,
        entities: Vec<Option<Entity>>,
        context: &BusinessDataContext,
    ) -> Result<Vec<Option<Entity>>, OperationError> {
        let stored = match self.load_ref(context)? {
            BusinessDataRef::Multi { data_ids, .. } => data_ids,
            other @ BusinessDataRef::Simple { .. } => {
                return Err(OperationError::RefShapeMismatch {
                    name: context.name().to_string(),
                    expected: "multi",
                    actual: other.shape(),
                })
            }
        };

        let mut new_ids = Vec::with_capacity(entities.len());
        for entity in &entities {
            let Some(entity) = entity else {
                return Err(OperationError::NullElementInList {
                    name: context.name().to_string(),
                });
            };
            let id = entity
                .persistence_id()
                .ok_or_else(|| OperationError::MissingPersistenceId {
                    type_name: entity.type_name().to_string(),
                })?;
            new_ids.push(id);
        }

        // Order is not compared; cardinality and containment are.
        let unchanged =
            stored.len() == new_ids.len() && new_ids.iter().all(|id| stored.contains(id));
        if unchanged {
            tracing::debug!(
                name = context.name(),
                "reference id set already up to date, skipping write"
            );
        } else {
            self.write_multi(context, new_ids)?;
        }
        Ok(entities)
    }

    /// The whole business-data variable was explicitly unassigned: clear the
    /// stored id (simple) or id list (multi).
    fn handle_null(&self, context: &BusinessDataContext) -> Result<(), OperationError> {
        match self.load_ref(context)? {
            BusinessDataRef::Simple { .. } => self.write_simple(context, None),
            BusinessDataRef::Multi { .. } => self.write_multi(context, Vec::new()),
        }
    }
}
