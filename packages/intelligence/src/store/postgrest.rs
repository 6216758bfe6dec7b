//! PostgREST-backed datastore (the Supabase REST surface).
//!
//! Schema selection travels in the `Accept-Profile` / `Content-Profile`
//! headers, not the URL. Upserts use `Prefer: resolution=merge-duplicates`
//! with an `on_conflict` column, which maps onto the native-constraint
//! path; probe-then-write is composed from the plain operations.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::security::SecretString;
use crate::traits::store::Datastore;

/// Datastore over a PostgREST endpoint.
pub struct PostgrestStore {
    base_url: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl PostgrestStore {
    /// Create a store for a project URL ("https://xyz.supabase.co") and a
    /// service key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<SecretString>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key: api_key.into(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(20))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn endpoint(&self, collection: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", self.api_key.expose())
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
    }

    async fn check_response(
        schema: &str,
        collection: &str,
        response: reqwest::Response,
    ) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        if status.as_u16() == 409 {
            return Err(StoreError::Conflict {
                schema: schema.to_string(),
                collection: collection.to_string(),
                key: message,
            });
        }
        Err(StoreError::Rejected {
            schema: schema.to_string(),
            collection: collection.to_string(),
            message: format!("{status}: {message}"),
        })
    }
}

#[async_trait]
impl Datastore for PostgrestStore {
    async fn select_id_by_key(
        &self,
        schema: &str,
        collection: &str,
        key_column: &str,
        key_value: &str,
    ) -> StoreResult<Option<String>> {
        let key_filter = format!("eq.{key_value}");
        let response = self
            .authed(self.client.get(self.endpoint(collection)))
            .header("Accept-Profile", schema)
            .query(&[
                ("select", "id"),
                (key_column, key_filter.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Http(Box::new(e)))?;

        let response = Self::check_response(schema, collection, response).await?;
        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| StoreError::Http(Box::new(e)))?;

        Ok(rows.first().and_then(|row| match row.get("id") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        }))
    }

    async fn insert(&self, schema: &str, collection: &str, row: &Value) -> StoreResult<()> {
        debug!(schema, collection, "postgrest insert");
        let response = self
            .authed(self.client.post(self.endpoint(collection)))
            .header("Content-Profile", schema)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await
            .map_err(|e| StoreError::Http(Box::new(e)))?;

        Self::check_response(schema, collection, response).await?;
        Ok(())
    }

    async fn update_by_id(
        &self,
        schema: &str,
        collection: &str,
        id: &str,
        row: &Value,
    ) -> StoreResult<()> {
        debug!(schema, collection, id, "postgrest update");
        let response = self
            .authed(self.client.patch(self.endpoint(collection)))
            .header("Content-Profile", schema)
            .header("Prefer", "return=minimal")
            .query(&[("id", &format!("eq.{id}"))])
            .json(row)
            .send()
            .await
            .map_err(|e| StoreError::Http(Box::new(e)))?;

        Self::check_response(schema, collection, response).await?;
        Ok(())
    }

    async fn upsert(
        &self,
        schema: &str,
        collection: &str,
        conflict_column: &str,
        row: &Value,
    ) -> StoreResult<()> {
        debug!(schema, collection, conflict_column, "postgrest upsert");
        let response = self
            .authed(self.client.post(self.endpoint(collection)))
            .header("Content-Profile", schema)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .query(&[("on_conflict", conflict_column)])
            .json(row)
            .send()
            .await
            .map_err(|e| StoreError::Http(Box::new(e)))?;

        Self::check_response(schema, collection, response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_shape() {
        let store = PostgrestStore::new("https://xyz.supabase.co/", "key");
        assert_eq!(
            store.endpoint("entries"),
            "https://xyz.supabase.co/rest/v1/entries"
        );
    }
}
