//! Collection access service.
//!
//! Entity-scoped CRUD over a [`DocumentStore`]. Each call loads the whole
//! document, works on the one collection it names and, for mutations, saves
//! the whole document back. Nothing is cached between calls and nothing
//! serializes concurrent mutations: the last save wins.

use crate::error::{AccessError, AccessResult};
use crate::query::{self, field_string, QueryDescriptor, ID_FIELD};
use flatrest_storage::{DocumentStore, Record};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Records returned by a list or create call, with their count.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub records: Vec<Record>,
    pub length: usize,
}

impl Listing {
    fn new(records: Vec<Record>) -> Self {
        let length = records.len();
        Self { records, length }
    }
}

/// One collection and how many records it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySummary {
    pub name: String,
    pub records: usize,
}

/// CRUD operations over the collections of one store.
#[derive(Clone)]
pub struct CollectionService {
    store: Arc<dyn DocumentStore>,
}

impl CollectionService {
    /// Create a service over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Every collection in the store with its record count, in document
    /// order.
    pub async fn entities(&self) -> AccessResult<Vec<EntitySummary>> {
        let document = self.store.load().await?;

        document
            .entity_names()
            .into_iter()
            .map(|name| {
                let records = document.records(&name)?.map_or(0, |r| r.len());
                Ok(EntitySummary { name, records })
            })
            .collect()
    }

    /// List the records of `entity`, filtered, searched and sorted as the
    /// query asks.
    ///
    /// An empty collection is reported the same way as a missing one.
    pub async fn list(&self, entity: &str, query: &QueryDescriptor) -> AccessResult<Listing> {
        let document = self.store.load().await?;
        let records = existing(document.records(entity)?, entity)?;

        let total = records.len();
        let records = query.apply(records);
        debug!(entity, total, matched = records.len(), "Listed records");

        Ok(Listing::new(records))
    }

    /// Fetch one record by the id given in a URL path.
    pub async fn get(&self, entity: &str, id: &str) -> AccessResult<Record> {
        let document = self.store.load().await?;
        let mut records = document.records(entity)?.unwrap_or_default();

        let index =
            query::resolve_path_id(&records, id).ok_or_else(|| record_not_found(entity, id))?;
        Ok(records.swap_remove(index))
    }

    /// Append a new record and return the whole collection.
    ///
    /// The payload must be an object with a non-empty `id` that no record of
    /// the collection already uses. The collection is created if needed.
    pub async fn create(&self, entity: &str, payload: Value) -> AccessResult<Listing> {
        let record = into_record(payload)?;
        let id = match record.get(ID_FIELD) {
            None | Some(Value::Null) => return Err(AccessError::MissingId),
            Some(Value::String(s)) if s.is_empty() => return Err(AccessError::MissingId),
            Some(id) => id.clone(),
        };

        let mut document = self.store.load().await?;
        let mut records = document.records(entity)?.unwrap_or_default();

        if query::find_by_id(&records, &id).is_some() {
            return Err(AccessError::DuplicateId {
                id: field_string(&id).into_owned(),
            });
        }

        records.push(record);
        document.set_records(entity, records.clone());
        self.store.save(&document).await?;
        info!(entity, id = %field_string(&id), "Created record");

        Ok(Listing::new(records))
    }

    /// Merge `payload` into an existing record and return the result.
    ///
    /// Only fields the record already has are overwritten; unknown fields
    /// in the payload are dropped. The payload may not mention `id` at all.
    /// The record keeps its position in the collection.
    pub async fn update(&self, entity: &str, id: &str, payload: Value) -> AccessResult<Record> {
        let changes = into_record(payload)?;
        if changes.contains_key(ID_FIELD) {
            return Err(AccessError::ImmutableId);
        }

        let mut document = self.store.load().await?;
        let mut records = existing(document.records(entity)?, entity)?;

        let index =
            query::resolve_path_id(&records, id).ok_or_else(|| record_not_found(entity, id))?;

        let mut updated = records[index].clone();
        for (field, value) in changes {
            if let Some(slot) = updated.get_mut(&field) {
                *slot = value;
            }
        }
        records[index] = updated.clone();

        document.set_records(entity, records);
        self.store.save(&document).await?;
        info!(entity, id, "Updated record");

        Ok(updated)
    }

    /// Remove one record by id.
    pub async fn delete(&self, entity: &str, id: &str) -> AccessResult<()> {
        let mut document = self.store.load().await?;
        let mut records = existing(document.records(entity)?, entity)?;

        let index =
            query::resolve_path_id(&records, id).ok_or_else(|| record_not_found(entity, id))?;
        records.remove(index);

        document.set_records(entity, records);
        self.store.save(&document).await?;
        info!(entity, id, "Deleted record");

        Ok(())
    }
}

/// Treat absent and empty collections alike.
fn existing(records: Option<Vec<Record>>, entity: &str) -> AccessResult<Vec<Record>> {
    records
        .filter(|records| !records.is_empty())
        .ok_or_else(|| AccessError::EntityNotFound {
            entity: entity.to_string(),
        })
}

fn into_record(payload: Value) -> AccessResult<Record> {
    match payload {
        Value::Object(record) => Ok(record),
        other => Err(AccessError::InvalidPayload(format!(
            "expected a JSON object, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn record_not_found(entity: &str, id: &str) -> AccessError {
    AccessError::RecordNotFound {
        entity: entity.to_string(),
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatrest_storage::{MemoryStore, StoreError};
    use serde_json::json;

    const BOOKS: &str = r#"{"books":[{"id":1,"title":"A"},{"id":2,"title":"B"}]}"#;

    fn service_with(content: &str) -> (CollectionService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_content(content));
        (CollectionService::new(store.clone()), store)
    }

    fn ids(records: &[Record]) -> Vec<Value> {
        records.iter().map(|r| r["id"].clone()).collect()
    }

    #[tokio::test]
    async fn test_list_sorted_desc() {
        let (service, _) = service_with(BOOKS);
        let query = QueryDescriptor::from_params([("_sort", "id"), ("_order", "desc")]);

        let listing = service.list("books", &query).await.unwrap();
        assert_eq!(listing.length, 2);
        assert_eq!(ids(&listing.records), vec![json!(2), json!(1)]);
    }

    #[tokio::test]
    async fn test_list_missing_and_empty_entity() {
        let (service, _) = service_with(r#"{"authors":[]}"#);
        let query = QueryDescriptor::default();

        let err = service.list("books", &query).await.unwrap_err();
        assert!(matches!(err, AccessError::EntityNotFound { .. }));

        let err = service.list("authors", &query).await.unwrap_err();
        assert!(matches!(err, AccessError::EntityNotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_with_no_matches_is_empty() {
        let (service, _) = service_with(BOOKS);
        let query = QueryDescriptor::from_params([("title", "Z")]);

        let listing = service.list("books", &query).await.unwrap();
        assert_eq!(listing.length, 0);
        assert!(listing.records.is_empty());
    }

    #[tokio::test]
    async fn test_get_record() {
        let (service, _) = service_with(BOOKS);
        let record = service.get("books", "1").await.unwrap();
        assert_eq!(Value::Object(record), json!({"id": 1, "title": "A"}));
    }

    #[tokio::test]
    async fn test_get_unknown_id() {
        let (service, _) = service_with(BOOKS);
        let err = service.get("books", "3").await.unwrap_err();
        assert_eq!(err.to_string(), "books with id 3 not found!");

        let err = service.get("authors", "1").await.unwrap_err();
        assert!(matches!(err, AccessError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let (service, _) = service_with("");
        let payload = json!({"id": 7, "title": "New", "tags": ["x"]});

        let listing = service.create("books", payload.clone()).await.unwrap();
        assert_eq!(listing.length, 1);

        let record = service.get("books", "7").await.unwrap();
        assert_eq!(Value::Object(record), payload);
    }

    #[tokio::test]
    async fn test_create_appends_and_persists() {
        let (service, store) = service_with(BOOKS);

        let listing = service
            .create("books", json!({"id": 3, "title": "C"}))
            .await
            .unwrap();
        assert_eq!(ids(&listing.records), vec![json!(1), json!(2), json!(3)]);
        assert_eq!(
            store.content().unwrap(),
            r#"{"books":[{"id":1,"title":"A"},{"id":2,"title":"B"},{"id":3,"title":"C"}]}"#
        );
    }

    #[tokio::test]
    async fn test_create_duplicate_id() {
        let (service, store) = service_with(BOOKS);

        let err = service
            .create("books", json!({"id": 2, "title": "C"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::DuplicateId { .. }));
        assert_eq!(store.content().unwrap(), BOOKS);
    }

    #[tokio::test]
    async fn test_create_missing_id() {
        let (service, _) = service_with(BOOKS);

        for payload in [
            json!({"title": "C"}),
            json!({"id": null, "title": "C"}),
            json!({"id": "", "title": "C"}),
        ] {
            let err = service.create("books", payload).await.unwrap_err();
            assert!(matches!(err, AccessError::MissingId));
        }
    }

    #[tokio::test]
    async fn test_create_rejects_non_object() {
        let (service, _) = service_with(BOOKS);
        let err = service.create("books", json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, AccessError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_update_merges_known_fields() {
        let (service, store) = service_with(BOOKS);

        let updated = service
            .update("books", "1", json!({"title": "A2", "pages": 100}))
            .await
            .unwrap();
        assert_eq!(Value::Object(updated), json!({"id": 1, "title": "A2"}));
        assert_eq!(
            store.content().unwrap(),
            r#"{"books":[{"id":1,"title":"A2"},{"id":2,"title":"B"}]}"#
        );
    }

    #[tokio::test]
    async fn test_update_rejects_id_in_payload() {
        let (service, store) = service_with(BOOKS);

        for payload in [json!({"id": 1}), json!({"id": 5, "title": "X"})] {
            let err = service.update("books", "1", payload).await.unwrap_err();
            assert!(matches!(err, AccessError::ImmutableId));
        }
        assert_eq!(store.content().unwrap(), BOOKS);
    }

    #[tokio::test]
    async fn test_update_not_found() {
        let (service, _) = service_with(BOOKS);

        let err = service
            .update("authors", "1", json!({"name": "X"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::EntityNotFound { .. }));

        let err = service
            .update("books", "9", json!({"title": "X"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_removes_one_record() {
        let (service, _) = service_with(BOOKS);

        service.delete("books", "2").await.unwrap();

        let listing = service
            .list("books", &QueryDescriptor::default())
            .await
            .unwrap();
        assert_eq!(listing.length, 1);
        let err = service.get("books", "2").await.unwrap_err();
        assert!(matches!(err, AccessError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_last_record_leaves_empty_collection() {
        let (service, store) = service_with(r#"{"books":[{"id":1}]}"#);

        service.delete("books", "1").await.unwrap();
        assert_eq!(store.content().unwrap(), r#"{"books":[]}"#);

        let err = service
            .list("books", &QueryDescriptor::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::EntityNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let (service, _) = service_with(BOOKS);

        let err = service.delete("books", "3").await.unwrap_err();
        assert!(matches!(err, AccessError::RecordNotFound { .. }));

        let err = service.delete("users", "1").await.unwrap_err();
        assert!(matches!(err, AccessError::EntityNotFound { .. }));
    }

    #[tokio::test]
    async fn test_malformed_store_surfaces() {
        let (service, _) = service_with("{broken");
        let err = service
            .list("books", &QueryDescriptor::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Store(StoreError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_entities() {
        let (service, _) = service_with(r#"{"books":[{"id":1}],"authors":[],"drafts":null}"#);
        let summaries = service.entities().await.unwrap();

        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["books", "authors", "drafts"]);
        assert_eq!(summaries[0].records, 1);
        assert_eq!(summaries[1].records, 0);
        assert_eq!(summaries[2].records, 0);
    }

    #[tokio::test]
    async fn test_string_ids_that_look_numeric_round_trip() {
        let (service, store) = service_with("");
        let payload = json!({"id": "42", "name": "Ann"});

        service.create("users", payload.clone()).await.unwrap();
        let record = service.get("users", "42").await.unwrap();
        assert_eq!(Value::Object(record), payload);

        let updated = service
            .update("users", "42", json!({"name": "Bea"}))
            .await
            .unwrap();
        assert_eq!(updated["name"], "Bea");

        service.delete("users", "42").await.unwrap();
        assert_eq!(store.content().unwrap(), r#"{"users":[]}"#);
    }

    #[tokio::test]
    async fn test_numeric_id_preferred_over_string_twin() {
        let (service, _) = service_with(r#"{"books":[{"id":"1","t":"s"},{"id":1,"t":"n"}]}"#);
        let record = service.get("books", "1").await.unwrap();
        assert_eq!(record["t"], "n");
    }

    #[tokio::test]
    async fn test_large_unsigned_id() {
        let (service, _) = service_with("");
        service
            .create("users", json!({"id": 18446744073709551615u64}))
            .await
            .unwrap();

        let record = service.get("users", "18446744073709551615").await.unwrap();
        assert_eq!(record["id"], json!(18446744073709551615u64));
    }
}
