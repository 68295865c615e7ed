//! Merge (insert-or-update) action.

use std::sync::Arc;

use crate::entity::EntityAction;
use crate::error::OperationError;
use crate::model::{BusinessDataContext, Entity};
use crate::services::BusinessDataRepository;

/// Persists entities via repository merge. A null whole-value is an error; a
/// null element inside a list is skipped and kept in place so positions
/// survive the batch.
#[derive(Clone)]
pub struct MergeEntityAction {
    repository: Arc<dyn BusinessDataRepository>,
}

impl MergeEntityAction {
    pub fn new(repository: Arc<dyn BusinessDataRepository>) -> Self {
        Self { repository }
    }
}

impl EntityAction for MergeEntityAction {
    fn execute(
        &self,
        entity: Entity,
        context: &BusinessDataContext,
    ) -> Result<Entity, OperationError> {
        let type_name = entity.type_name().to_string();
        self.repository
            .merge(entity)
            .map_err(|source| OperationError::Write {
                what: "business data entity",
                name: format!("{} ({})", context.name(), type_name),
                source,
            })
    }

    fn execute_list(
        &self,
        entities: Vec<Option<Entity>>,
        context: &BusinessDataContext,
    ) -> Result<Vec<Option<Entity>>, OperationError> {
        let mut merged = Vec::with_capacity(entities.len());
        for entity in entities {
            match entity {
                Some(entity) => merged.push(Some(self.execute(entity, context)?)),
                None => merged.push(None),
            }
        }
        Ok(merged)
    }

    fn handle_null(&self, _context: &BusinessDataContext) -> Result<(), OperationError> {
        Err(OperationError::NullEntity)
    }
}
