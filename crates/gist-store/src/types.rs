//! Data types for simulation records.

use serde::{Deserialize, Serialize};

/// A simulation row from the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub id: i64,
    pub created_at: String,
    /// The simulation configuration, kept opaque.
    pub json: serde_json::Value,
    #[serde(default, rename = "from_AI", alias = "from_ai")]
    pub from_ai: bool,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub changes_made: Option<String>,
}

impl SimulationRecord {
    /// A record without a parent is the root of its version history.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Fields for inserting a simulation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewSimulation {
    pub json: serde_json::Value,
    #[serde(rename = "from_AI")]
    pub from_ai: bool,
    pub parent_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl NewSimulation {
    /// Build an insert from a configuration, lifting its title and description.
    pub fn from_json(json: serde_json::Value, from_ai: bool, parent_id: Option<i64>) -> Self {
        let text_field = |key: &str| {
            json.get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };
        let title = text_field("title");
        let description = text_field("description");
        Self {
            json,
            from_ai,
            parent_id,
            title,
            description,
        }
    }
}
