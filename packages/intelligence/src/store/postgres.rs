//! Direct-PostgreSQL datastore.
//!
//! For deployments that talk to the database without the REST surface.
//! Identifiers come from the static routing table, but every one is still
//! validated before interpolation; bind parameters carry all row data.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::Datastore;

/// PostgreSQL-backed datastore over a connection pool.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to a database URL.
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Reject anything that is not a plain lowercase SQL identifier.
fn check_ident(ident: &str) -> StoreResult<()> {
    let ok = !ident.is_empty()
        && ident
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !ident.starts_with(|c: char| c.is_ascii_digit());
    if ok {
        Ok(())
    } else {
        Err(StoreError::Rejected {
            schema: String::new(),
            collection: String::new(),
            message: format!("invalid identifier: {ident}"),
        })
    }
}

/// Column names of a JSON row, validated, in stable order.
fn row_columns(row: &Value) -> StoreResult<Vec<&str>> {
    let object = row.as_object().ok_or_else(|| StoreError::Rejected {
        schema: String::new(),
        collection: String::new(),
        message: "row payload must be a JSON object".to_string(),
    })?;

    let mut columns: Vec<&str> = object.keys().map(String::as_str).collect();
    columns.sort_unstable();
    for column in &columns {
        check_ident(column)?;
    }
    Ok(columns)
}

#[async_trait]
impl Datastore for PostgresStore {
    async fn select_id_by_key(
        &self,
        schema: &str,
        collection: &str,
        key_column: &str,
        key_value: &str,
    ) -> StoreResult<Option<String>> {
        check_ident(schema)?;
        check_ident(collection)?;
        check_ident(key_column)?;

        let sql = format!(
            "SELECT id::text FROM {schema}.{collection} WHERE {key_column} = $1 LIMIT 1"
        );
        let id: Option<String> = sqlx::query_scalar(&sql)
            .bind(key_value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))?;

        Ok(id)
    }

    async fn insert(&self, schema: &str, collection: &str, row: &Value) -> StoreResult<()> {
        check_ident(schema)?;
        check_ident(collection)?;
        let columns = row_columns(row)?;
        let column_list = columns.join(", ");

        debug!(schema, collection, "postgres insert");
        let sql = format!(
            "INSERT INTO {schema}.{collection} ({column_list}) \
             SELECT {column_list} FROM jsonb_populate_record(NULL::{schema}.{collection}, $1)"
        );
        sqlx::query(&sql)
            .bind(row)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))?;
        Ok(())
    }

    async fn update_by_id(
        &self,
        schema: &str,
        collection: &str,
        id: &str,
        row: &Value,
    ) -> StoreResult<()> {
        check_ident(schema)?;
        check_ident(collection)?;
        let columns = row_columns(row)?;
        let assignments = columns
            .iter()
            .map(|c| format!("{c} = v.{c}"))
            .collect::<Vec<_>>()
            .join(", ");

        debug!(schema, collection, id, "postgres update");
        let sql = format!(
            "UPDATE {schema}.{collection} AS t SET {assignments} \
             FROM jsonb_populate_record(NULL::{schema}.{collection}, $2) AS v \
             WHERE t.id::text = $1"
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(row)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))?;
        Ok(())
    }

    async fn upsert(
        &self,
        schema: &str,
        collection: &str,
        conflict_column: &str,
        row: &Value,
    ) -> StoreResult<()> {
        check_ident(schema)?;
        check_ident(collection)?;
        check_ident(conflict_column)?;
        let columns = row_columns(row)?;
        let column_list = columns.join(", ");
        let updates = columns
            .iter()
            .filter(|c| **c != conflict_column)
            .map(|c| format!("{c} = EXCLUDED.{c}"))
            .collect::<Vec<_>>()
            .join(", ");

        debug!(schema, collection, conflict_column, "postgres upsert");
        let sql = if updates.is_empty() {
            format!(
                "INSERT INTO {schema}.{collection} ({column_list}) \
                 SELECT {column_list} FROM jsonb_populate_record(NULL::{schema}.{collection}, $1) \
                 ON CONFLICT ({conflict_column}) DO NOTHING"
            )
        } else {
            format!(
                "INSERT INTO {schema}.{collection} ({column_list}) \
                 SELECT {column_list} FROM jsonb_populate_record(NULL::{schema}.{collection}, $1) \
                 ON CONFLICT ({conflict_column}) DO UPDATE SET {updates}"
            )
        };
        sqlx::query(&sql)
            .bind(row)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))?;
        Ok(())
    }
}
