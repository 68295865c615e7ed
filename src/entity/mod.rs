//! Entity actions: the capability layer business-data updates route through.

pub mod action;
pub mod executor;
pub mod merge;
pub mod update_ref;

pub use action::EntityAction;
pub use executor::EntitiesActionsExecutor;
pub use merge::MergeEntityAction;
pub use update_ref::UpdateDataRefAction;
