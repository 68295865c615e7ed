//! Plain and transient data rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Container, ContainerType};

/// A plain or transient data row. Mutated in place by updates; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataInstance {
    pub name: String,
    pub value: Value,
    pub container_id: i64,
    pub container_type: ContainerType,
}

impl DataInstance {
    pub fn new(name: impl Into<String>, value: Value, container: Container) -> Self {
        Self {
            name: name.into(),
            value,
            container_id: container.id,
            container_type: container.container_type,
        }
    }

    pub fn container(&self) -> Container {
        Container {
            id: self.container_id,
            container_type: self.container_type,
        }
    }
}
