//! Business data: domain entities, their persisted references and the type
//! registry used to construct fresh instances.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::OperationError;
use crate::model::Container;

/// Reserved JSON keys carried by every serialized entity.
const TYPE_KEY: &str = "_type";
const PERSISTENCE_ID_KEY: &str = "persistenceId";

/// Lookup key for a business-data reference: variable name plus the container
/// it is scoped to. Pure value object, created fresh per lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BusinessDataContext {
    name: String,
    container: Container,
}

impl BusinessDataContext {
    pub fn new(name: impl Into<String>, container: Container) -> Self {
        Self {
            name: name.into(),
            container,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container(&self) -> Container {
        self.container
    }
}

/// Persisted link from a process variable to one or many entity rows.
///
/// The shape of the stored reference must match the shape of the runtime
/// value; a mismatch is a hard error, never silently coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusinessDataRef {
    Simple {
        name: String,
        type_name: String,
        data_id: Option<i64>,
    },
    Multi {
        name: String,
        type_name: String,
        data_ids: Vec<i64>,
    },
}

impl BusinessDataRef {
    pub fn name(&self) -> &str {
        match self {
            BusinessDataRef::Simple { name, .. } | BusinessDataRef::Multi { name, .. } => name,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            BusinessDataRef::Simple { type_name, .. }
            | BusinessDataRef::Multi { type_name, .. } => type_name,
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            BusinessDataRef::Simple { .. } => "simple",
            BusinessDataRef::Multi { .. } => "multi",
        }
    }
}

/// A domain entity row. Field values are plain JSON; `persistence_id` is
/// assigned by the repository on first merge.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    type_name: String,
    persistence_id: Option<i64>,
    fields: Map<String, Value>,
}

impl Entity {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            persistence_id: None,
            fields: Map::new(),
        }
    }

    pub fn with_id(type_name: impl Into<String>, persistence_id: i64) -> Self {
        Self {
            type_name: type_name.into(),
            persistence_id: Some(persistence_id),
            fields: Map::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn persistence_id(&self) -> Option<i64> {
        self.persistence_id
    }

    pub fn set_persistence_id(&mut self, id: i64) {
        self.persistence_id = Some(id);
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert(TYPE_KEY.to_string(), Value::String(self.type_name.clone()));
        match self.persistence_id {
            Some(id) => map.insert(PERSISTENCE_ID_KEY.to_string(), Value::from(id)),
            None => map.insert(PERSISTENCE_ID_KEY.to_string(), Value::Null),
        };
        Value::Object(map)
    }

    pub fn from_value(value: &Value) -> Result<Self, OperationError> {
        let Value::Object(map) = value else {
            return Err(OperationError::InvalidBusinessValue {
                actual: json_type_name(value),
            });
        };
        let Some(type_name) = map.get(TYPE_KEY).and_then(Value::as_str) else {
            return Err(OperationError::InvalidBusinessValue { actual: "Object" });
        };
        let persistence_id = map.get(PERSISTENCE_ID_KEY).and_then(Value::as_i64);
        let mut fields = map.clone();
        fields.remove(TYPE_KEY);
        fields.remove(PERSISTENCE_ID_KEY);
        Ok(Self {
            type_name: type_name.to_string(),
            persistence_id,
            fields,
        })
    }
}

/// Runtime shape of a business-data value, decided once at the subsystem
/// boundary and pattern-matched everywhere else.
///
/// `Many` keeps null elements in place: batch merge skips them, reference
/// rewriting rejects them, so the two paths must both see them.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityValue {
    Single(Entity),
    Many(Vec<Option<Entity>>),
    Empty,
}

impl EntityValue {
    pub fn from_value(value: &Value) -> Result<Self, OperationError> {
        match value {
            Value::Null => Ok(EntityValue::Empty),
            Value::Object(_) => Ok(EntityValue::Single(Entity::from_value(value)?)),
            Value::Array(items) => {
                let mut entities = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Null => entities.push(None),
                        other => entities.push(Some(Entity::from_value(other)?)),
                    }
                }
                Ok(EntityValue::Many(entities))
            }
            other => Err(OperationError::InvalidBusinessValue {
                actual: json_type_name(other),
            }),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            EntityValue::Single(entity) => entity.to_value(),
            EntityValue::Many(entities) => Value::Array(
                entities
                    .iter()
                    .map(|e| e.as_ref().map(Entity::to_value).unwrap_or(Value::Null))
                    .collect(),
            ),
            EntityValue::Empty => Value::Null,
        }
    }
}

/// JSON runtime type name, used in type-mismatch diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "Integer",
        Value::Number(_) => "Float",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

type EntityFactory = Arc<dyn Fn() -> Entity + Send + Sync>;

/// Registry of known business-data types, populated at domain-model load
/// time. Replaces runtime classloading: constructing a fresh instance is an
/// explicit factory lookup.
#[derive(Clone, Default)]
pub struct EntityTypeRegistry {
    factories: HashMap<String, EntityFactory>,
}

impl EntityTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type with the default factory (an entity with no fields).
    pub fn register(&mut self, type_name: impl Into<String>) {
        let type_name = type_name.into();
        let for_factory = type_name.clone();
        self.factories
            .insert(type_name, Arc::new(move || Entity::new(for_factory.clone())));
    }

    pub fn register_with(
        &mut self,
        type_name: impl Into<String>,
        factory: impl Fn() -> Entity + Send + Sync + 'static,
    ) {
        self.factories.insert(type_name.into(), Arc::new(factory));
    }

    pub fn new_instance(&self, type_name: &str) -> Result<Entity, OperationError> {
        self.factories
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| OperationError::UnknownEntityType(type_name.to_string()))
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }
}

impl std::fmt::Debug for EntityTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityTypeRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
