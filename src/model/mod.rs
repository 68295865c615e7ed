//! Domain model: operands, containers, business data, documents and data
//! rows.

pub mod business_data;
pub mod data_instance;
pub mod document;
pub mod operand;

pub use business_data::{
    json_type_name, BusinessDataContext, BusinessDataRef, Entity, EntityTypeRegistry, EntityValue,
};
pub use data_instance::DataInstance;
pub use document::{Document, DocumentRecord, DocumentValue};
pub use operand::{Container, ContainerType, LeftOperand, OperandKind, Operation};
