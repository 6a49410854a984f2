//! Hosted simulation store reached through a PostgREST (Supabase) endpoint.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::store::SimulationStore;
use crate::types::*;
use gist_core::{Error, Result};

const TABLE: &str = "simulations";

/// PostgREST client for the `simulations` table.
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    service_key: String,
}

#[derive(Deserialize)]
struct JsonOnly {
    json: serde_json::Value,
}

#[derive(Deserialize)]
struct IdOnly {
    id: i64,
}

impl PostgrestStore {
    /// `base_url` is the project URL, e.g. `https://xyz.supabase.co`.
    pub fn new(client: Client, base_url: &str, service_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    async fn select<T: DeserializeOwned>(&self, id: i64, columns: &str) -> Result<Option<T>> {
        debug!("PostgREST select {} from {} id={}", columns, TABLE, id);
        let response = self
            .authorized(self.client.get(self.table_url()))
            .query(&[("id", format!("eq.{}", id)), ("select", columns.to_string())])
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;
        let rows: Vec<T> = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Database(format!("Malformed PostgREST response: {}", e)))?;
        Ok(rows.into_iter().next())
    }

    async fn checked(response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Database(format!("PostgREST error {}: {}", status, body)))
    }
}

#[async_trait]
impl SimulationStore for PostgrestStore {
    async fn get_simulation(&self, id: i64) -> Result<Option<SimulationRecord>> {
        self.select(id, "*").await
    }

    async fn get_simulation_json(&self, id: i64) -> Result<Option<serde_json::Value>> {
        Ok(self.select::<JsonOnly>(id, "json").await?.map(|row| row.json))
    }

    async fn update_changes_made(&self, id: i64, changes_made: &str) -> Result<bool> {
        let response = self
            .authorized(self.client.patch(self.table_url()))
            .query(&[("id", format!("eq.{}", id)), ("select", "id".to_string())])
            .header("Prefer", "return=representation")
            .json(&json!({ "changes_made": changes_made }))
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;
        let rows: Vec<IdOnly> = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Database(format!("Malformed PostgREST response: {}", e)))?;
        Ok(!rows.is_empty())
    }

    async fn insert_simulation(&self, new: NewSimulation) -> Result<i64> {
        let response = self
            .authorized(self.client.post(self.table_url()))
            .query(&[("select", "id")])
            .header("Prefer", "return=representation")
            .json(&new)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;
        let rows: Vec<IdOnly> = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Database(format!("Malformed PostgREST response: {}", e)))?;
        rows.first()
            .map(|row| row.id)
            .ok_or_else(|| Error::Database("Insert returned no rows".into()))
    }
}
