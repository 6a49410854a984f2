//! The storage seam used by request handlers.

use async_trait::async_trait;

use crate::types::{NewSimulation, SimulationRecord};
use gist_core::Result;

/// Read/write access to simulation records.
#[async_trait]
pub trait SimulationStore: Send + Sync {
    /// Fetch a full record by id.
    async fn get_simulation(&self, id: i64) -> Result<Option<SimulationRecord>>;

    /// Fetch only the configuration document of a record.
    async fn get_simulation_json(&self, id: i64) -> Result<Option<serde_json::Value>>;

    /// Overwrite `changes_made`. Returns false when no record has that id.
    async fn update_changes_made(&self, id: i64, changes_made: &str) -> Result<bool>;

    /// Insert a record and return its id.
    async fn insert_simulation(&self, new: NewSimulation) -> Result<i64>;
}
