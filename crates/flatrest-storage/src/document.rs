//! The in-memory form of the store.

use crate::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record of a collection: a schema-less JSON object.
pub type Record = Map<String, Value>;

/// The whole dataset: entity name to collection.
///
/// Collections are kept as raw JSON values and only checked when an entity
/// is accessed, so a single bad collection does not make the others
/// unreadable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    entities: Map<String, Value>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse document text read from `location`.
    pub fn parse(text: &str, location: &str) -> StoreResult<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| StoreError::malformed(location, e))?;
        match value {
            Value::Object(entities) => Ok(Self { entities }),
            _ => Err(StoreError::NotAnObject {
                location: location.to_string(),
            }),
        }
    }

    /// Serialize the document.
    pub fn to_json(&self, pretty: bool) -> StoreResult<String> {
        let text = if pretty {
            serde_json::to_string_pretty(&self.entities)?
        } else {
            serde_json::to_string(&self.entities)?
        };
        Ok(text)
    }

    /// Names of all entities, in document order.
    pub fn entity_names(&self) -> Vec<String> {
        self.entities.keys().cloned().collect()
    }

    /// The records of `entity`, or `None` if the entity is absent.
    ///
    /// A `null` value counts as absent.
    pub fn records(&self, entity: &str) -> StoreResult<Option<Vec<Record>>> {
        match self.entities.get(entity) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| StoreError::InvalidCollection {
                    entity: entity.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    /// Replace the records of `entity`, creating it if needed.
    pub fn set_records(&mut self, entity: &str, records: Vec<Record>) {
        let items = records.into_iter().map(Value::Object).collect();
        self.entities.insert(entity.to_string(), Value::Array(items));
    }
}
