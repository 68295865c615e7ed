//! Shape dispatch for entity actions.

use crate::entity::EntityAction;
use crate::error::OperationError;
use crate::model::{BusinessDataContext, EntityValue};

/// Dispatches a business-data value to the matching branch of an
/// [`EntityAction`]. The value's shape was decided once at the subsystem
/// boundary; anything that is not an entity, a list of entities or null never
/// gets this far.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntitiesActionsExecutor;

impl EntitiesActionsExecutor {
    pub fn new() -> Self {
        Self
    }

    pub fn execute_action(
        &self,
        value: EntityValue,
        context: &BusinessDataContext,
        action: &dyn EntityAction,
    ) -> Result<EntityValue, OperationError> {
        match value {
            EntityValue::Empty => {
                action.handle_null(context)?;
                Ok(EntityValue::Empty)
            }
            EntityValue::Single(entity) => {
                Ok(EntityValue::Single(action.execute(entity, context)?))
            }
            EntityValue::Many(entities) => {
                Ok(EntityValue::Many(action.execute_list(entities, context)?))
            }
        }
    }
}
