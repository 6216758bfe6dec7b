//! Datastore trait over schema-qualified collections.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreResult;

/// Row-level operations against a destination datastore.
///
/// Every call is addressed by `(schema, collection)`, matching the routing
/// table's targets. Rows travel as JSON objects so per-collection adapters
/// can shape payloads without the store knowing column layouts.
///
/// # Implementations
///
/// - `PostgrestStore` - Supabase / PostgREST over HTTP (default backend)
/// - `PostgresStore` - direct SQL via sqlx (behind the `postgres` feature)
/// - `MemoryStore` - in-process map for tests
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Look up a row id by an arbitrary key column. Returns `None` when no
    /// row matches.
    async fn select_id_by_key(
        &self,
        schema: &str,
        collection: &str,
        key_column: &str,
        key_value: &str,
    ) -> StoreResult<Option<String>>;

    /// Insert a new row.
    async fn insert(&self, schema: &str, collection: &str, row: &Value) -> StoreResult<()>;

    /// Update an existing row by id.
    async fn update_by_id(
        &self,
        schema: &str,
        collection: &str,
        id: &str,
        row: &Value,
    ) -> StoreResult<()>;

    /// Insert-or-update on a native unique constraint.
    async fn upsert(
        &self,
        schema: &str,
        collection: &str,
        conflict_column: &str,
        row: &Value,
    ) -> StoreResult<()>;
}
