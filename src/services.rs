//! Consumed service interfaces.
//!
//! These are the subsystem's view of the engine's persistence and session
//! layers. All calls are synchronous; concurrency control lives behind these
//! traits, not in front of them. Concrete implementations are supplied by the
//! invoking engine; tests use in-memory fakes.

use std::sync::Arc;

use serde_json::Value;

use crate::error::StoreError;
use crate::model::{
    BusinessDataContext, BusinessDataRef, ContainerType, DataInstance, Document, DocumentRecord,
    DocumentValue, Entity, EntityTypeRegistry,
};

/// Minimal flow-node row: enough to walk from an activity to its process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowNodeInstance {
    pub id: i64,
    pub parent_process_instance_id: i64,
    pub root_container_id: i64,
}

/// What started a process instance, for walking a sub-process caller chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerType {
    None,
    CallActivity,
    SubProcess,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInstance {
    pub id: i64,
    pub caller_id: Option<i64>,
    pub caller_type: CallerType,
}

/// Read access to process and flow-node instances, plus the denormalized
/// search-key slots stored on the process-instance row.
pub trait ProcessReadService: Send + Sync {
    fn flow_node_instance(&self, id: i64) -> Result<FlowNodeInstance, StoreError>;
    fn process_instance(&self, id: i64) -> Result<ProcessInstance, StoreError>;
    fn update_search_key(
        &self,
        process_instance_id: i64,
        slot: u8,
        value: Option<String>,
    ) -> Result<(), StoreError>;
}

/// Store for data rows. Both the durable store and the transient
/// (non-durable) store expose this same surface; the two handlers simply hold
/// different instances.
pub trait DataInstanceStore: Send + Sync {
    fn data_instance(
        &self,
        name: &str,
        container_id: i64,
        container_type: ContainerType,
    ) -> Result<DataInstance, StoreError>;

    fn update_data_instance(
        &self,
        instance: &DataInstance,
        new_value: Value,
    ) -> Result<(), StoreError>;
}

/// Repository for business-data entities.
pub trait BusinessDataRepository: Send + Sync {
    fn find_by_id(&self, type_name: &str, id: i64) -> Result<Entity, StoreError>;
    fn find_by_ids(&self, type_name: &str, ids: &[i64]) -> Result<Vec<Entity>, StoreError>;
    /// Insert-or-update; returns the entity with its persistence id assigned.
    fn merge(&self, entity: Entity) -> Result<Entity, StoreError>;
    fn remove(&self, entity: &Entity) -> Result<(), StoreError>;
}

/// Store for the persisted references linking variables to entity rows.
pub trait RefStore: Send + Sync {
    fn get_ref(&self, context: &BusinessDataContext) -> Result<BusinessDataRef, StoreError>;
    fn update_simple_ref(
        &self,
        context: &BusinessDataContext,
        data_id: Option<i64>,
    ) -> Result<(), StoreError>;
    fn update_multi_ref(
        &self,
        context: &BusinessDataContext,
        data_ids: Vec<i64>,
    ) -> Result<(), StoreError>;
}

/// Document storage, versioned per (process instance, name).
pub trait DocumentService: Send + Sync {
    fn get_document(&self, process_instance_id: i64, name: &str) -> Result<Document, StoreError>;

    fn attach_document(
        &self,
        process_instance_id: i64,
        record: DocumentRecord,
        content: Option<&[u8]>,
    ) -> Result<Document, StoreError>;

    fn update_document(
        &self,
        document_id: i64,
        record: DocumentRecord,
        content: Option<&[u8]>,
    ) -> Result<Document, StoreError>;

    fn remove_current_version(
        &self,
        process_instance_id: i64,
        name: &str,
    ) -> Result<(), StoreError>;

    fn document_list(
        &self,
        process_instance_id: i64,
        name: &str,
    ) -> Result<Vec<Document>, StoreError>;

    /// Replace the full document-list association for the variable.
    fn set_document_list(
        &self,
        process_instance_id: i64,
        name: &str,
        documents: Vec<DocumentValue>,
    ) -> Result<Vec<Document>, StoreError>;
}

/// Resolves the acting user, for authorship stamping.
pub trait SessionAccessor: Send + Sync {
    fn user_id(&self) -> Result<i64, StoreError>;
}

/// Invokes a domain method on a business-data target. The concrete
/// implementation lives with the domain model, outside this subsystem.
pub trait BusinessMethodInvoker: Send + Sync {
    fn invoke(
        &self,
        target: &Value,
        method: &str,
        parameter: &Value,
        parameter_type: Option<&str>,
    ) -> Result<Value, StoreError>;
}

/// The service bundle the handler registry is wired from.
#[derive(Clone)]
pub struct OperationServices {
    pub process: Arc<dyn ProcessReadService>,
    pub data: Arc<dyn DataInstanceStore>,
    pub transient_data: Arc<dyn DataInstanceStore>,
    pub repository: Arc<dyn BusinessDataRepository>,
    pub refs: Arc<dyn RefStore>,
    pub documents: Arc<dyn DocumentService>,
    pub session: Arc<dyn SessionAccessor>,
    pub entity_types: Arc<EntityTypeRegistry>,
}
