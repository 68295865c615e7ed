//! The capability applied to business-data values by the executor.

use crate::error::OperationError;
use crate::model::{BusinessDataContext, Entity};

/// An action over a single entity or a list of entities, with an explicit
/// null-handling policy.
///
/// The three null situations stay distinct: a whole-value null routes to
/// [`handle_null`](EntityAction::handle_null); a null *element* inside a list
/// reaches [`execute_list`](EntityAction::execute_list) as `None` and each
/// action decides what to do with it; a missing id on a simple reference is
/// not this trait's concern at all (the load path substitutes a fresh
/// instance).
pub trait EntityAction: Send + Sync {
    fn execute(
        &self,
        entity: Entity,
        context: &BusinessDataContext,
    ) -> Result<Entity, OperationError>;

    fn execute_list(
        &self,
        entities: Vec<Option<Entity>>,
        context: &BusinessDataContext,
    ) -> Result<Vec<Option<Entity>>, OperationError>;

    fn handle_null(&self, context: &BusinessDataContext) -> Result<(), OperationError>;
}
