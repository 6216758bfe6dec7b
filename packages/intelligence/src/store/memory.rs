//! In-memory datastore for tests and dry runs.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::traits::store::Datastore;

type Collection = Vec<(String, Value)>;

/// Map-backed `Datastore`. Rows live in insertion order per
/// `(schema, collection)` pair, with sequential string ids.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<(String, String), Collection>>,
    next_id: RwLock<u64>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows in a collection, for assertions.
    pub fn rows(&self, schema: &str, collection: &str) -> Vec<Value> {
        self.collections
            .read()
            .unwrap()
            .get(&(schema.to_string(), collection.to_string()))
            .map(|rows| rows.iter().map(|(_, v)| v.clone()).collect())
            .unwrap_or_default()
    }

    /// Row count in a collection.
    pub fn len(&self, schema: &str, collection: &str) -> usize {
        self.rows(schema, collection).len()
    }

    /// Whether a collection is empty or absent.
    pub fn is_empty(&self, schema: &str, collection: &str) -> bool {
        self.len(schema, collection) == 0
    }

    fn alloc_id(&self) -> String {
        let mut next = self.next_id.write().unwrap();
        *next += 1;
        next.to_string()
    }

    fn key_matches(row: &Value, column: &str, value: &str) -> bool {
        row.get(column).and_then(Value::as_str) == Some(value)
    }

    /// Merge incoming object fields over an existing row.
    fn merge(existing: &mut Value, incoming: &Value) {
        if let (Value::Object(old), Value::Object(new)) = (existing, incoming) {
            for (k, v) in new {
                old.insert(k.clone(), v.clone());
            }
        }
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn select_id_by_key(
        &self,
        schema: &str,
        collection: &str,
        key_column: &str,
        key_value: &str,
    ) -> StoreResult<Option<String>> {
        let collections = self.collections.read().unwrap();
        Ok(collections
            .get(&(schema.to_string(), collection.to_string()))
            .and_then(|rows| {
                rows.iter()
                    .find(|(_, row)| Self::key_matches(row, key_column, key_value))
                    .map(|(id, _)| id.clone())
            }))
    }

    async fn insert(&self, schema: &str, collection: &str, row: &Value) -> StoreResult<()> {
        let id = self.alloc_id();
        self.collections
            .write()
            .unwrap()
            .entry((schema.to_string(), collection.to_string()))
            .or_default()
            .push((id, row.clone()));
        Ok(())
    }

    async fn update_by_id(
        &self,
        schema: &str,
        collection: &str,
        id: &str,
        row: &Value,
    ) -> StoreResult<()> {
        let mut collections = self.collections.write().unwrap();
        if let Some(rows) = collections.get_mut(&(schema.to_string(), collection.to_string())) {
            if let Some((_, existing)) = rows.iter_mut().find(|(row_id, _)| row_id == id) {
                Self::merge(existing, row);
            }
        }
        Ok(())
    }

    async fn upsert(
        &self,
        schema: &str,
        collection: &str,
        conflict_column: &str,
        row: &Value,
    ) -> StoreResult<()> {
        let key_value = row
            .get(conflict_column)
            .and_then(Value::as_str)
            .map(String::from);

        // Guard stays inside this block so the future remains Send.
        {
            let mut collections = self.collections.write().unwrap();
            let rows = collections
                .entry((schema.to_string(), collection.to_string()))
                .or_default();

            if let Some(key) = key_value {
                if let Some((_, existing)) = rows
                    .iter_mut()
                    .find(|(_, r)| Self::key_matches(r, conflict_column, &key))
                {
                    Self::merge(existing, row);
                    return Ok(());
                }
            }
        }

        self.insert(schema, collection, row).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_select() {
        let store = MemoryStore::new();
        store
            .insert("s", "t", &json!({"source_url": "https://e.com/a", "title": "A"}))
            .await
            .unwrap();

        let id = store
            .select_id_by_key("s", "t", "source_url", "https://e.com/a")
            .await
            .unwrap();
        assert!(id.is_some());

        let missing = store
            .select_id_by_key("s", "t", "source_url", "https://e.com/b")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryStore::new();
        let row = json!({"source_url": "https://e.com/a", "title": "A"});

        store.upsert("s", "t", "source_url", &row).await.unwrap();
        store.upsert("s", "t", "source_url", &row).await.unwrap();

        assert_eq!(store.len("s", "t"), 1);
    }

    #[tokio::test]
    async fn test_upsert_merges_new_fields() {
        let store = MemoryStore::new();
        store
            .upsert("s", "t", "source_url", &json!({"source_url": "u", "title": "old"}))
            .await
            .unwrap();
        store
            .upsert("s", "t", "source_url", &json!({"source_url": "u", "summary": "new"}))
            .await
            .unwrap();

        let rows = store.rows("s", "t");
        assert_eq!(rows[0]["title"], "old");
        assert_eq!(rows[0]["summary"], "new");
    }

    #[tokio::test]
    async fn test_update_by_id() {
        let store = MemoryStore::new();
        store
            .insert("s", "t", &json!({"name": "Jane", "role": "official"}))
            .await
            .unwrap();
        let id = store
            .select_id_by_key("s", "t", "name", "Jane")
            .await
            .unwrap()
            .unwrap();

        store
            .update_by_id("s", "t", &id, &json!({"role": "mayor"}))
            .await
            .unwrap();

        assert_eq!(store.rows("s", "t")[0]["role"], "mayor");
        assert_eq!(store.len("s", "t"), 1);
    }

    #[tokio::test]
    async fn test_upsert_usable_from_spawned_task() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let handle = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .upsert("s", "t", "source_url", &json!({"source_url": "u"}))
                    .await
            })
        };
        handle.await.unwrap().unwrap();
        assert_eq!(store.len("s", "t"), 1);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryStore::new();
        store.insert("a", "t", &json!({"x": 1})).await.unwrap();
        store.insert("b", "t", &json!({"x": 2})).await.unwrap();

        assert_eq!(store.len("a", "t"), 1);
        assert_eq!(store.len("b", "t"), 1);
    }
}
