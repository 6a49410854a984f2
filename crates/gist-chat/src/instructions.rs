//! The fixed instruction bundle prepended to generation requests.

use std::path::Path;

use tracing::info;

use crate::types::{ChatMessage, Role};
use gist_core::{Error, Result};

/// Task description and output-format rules for simulation generation.
pub const BASE_INSTRUCTIONS: &str = include_str!("../assets/instructions.md");

/// JSON Schema of the simulation configuration format.
pub const SIMULATION_SCHEMA: &str = include_str!("../assets/simulation_schema.json");

const SEPARATOR: &str = "\n\n";

/// Instruction text plus the serialized schema, built once at startup.
#[derive(Debug, Clone)]
pub struct InstructionBundle {
    text: String,
    schema: String,
}

impl InstructionBundle {
    /// Combine an instruction block with a schema document.
    ///
    /// The schema is re-serialized pretty-printed so the model always sees
    /// the same layout regardless of how the source file was formatted.
    pub fn new(instructions: &str, schema: &str) -> Result<Self> {
        let parsed: serde_json::Value = serde_json::from_str(schema)?;
        let schema = serde_json::to_string_pretty(&parsed)?;
        let text = format!(
            "{}{}## JSON SCHEMA{}{}",
            instructions.trim_end(),
            SEPARATOR,
            SEPARATOR,
            schema
        );
        Ok(Self { text, schema })
    }

    /// The bundled instructions and schema.
    pub fn bundled() -> Result<Self> {
        Self::new(BASE_INSTRUCTIONS, SIMULATION_SCHEMA)
    }

    /// The bundled instructions with the schema read from `schema_path` when given.
    pub fn load(schema_path: Option<&Path>) -> Result<Self> {
        match schema_path {
            Some(path) => {
                let schema = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read schema {}: {}", path.display(), e))
                })?;
                info!("Loaded simulation schema from {}", path.display());
                Self::new(BASE_INSTRUCTIONS, &schema)
            }
            None => Self::bundled(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Pretty-printed schema document.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// The bundle followed by any caller-supplied system text.
    pub fn extended_with(&self, extra: Option<&str>) -> String {
        match extra {
            Some(extra) => format!("{}{}{}", self.text, SEPARATOR, extra),
            None => self.text.clone(),
        }
    }
}

/// Split a conversation into joined system text and the remaining turns.
///
/// System messages are joined in arrival order with blank lines; `None` when
/// there are none. Other messages keep their order.
pub fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<ChatMessage>) {
    let mut system: Option<String> = None;
    let mut turns = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg.role {
            Role::System => match system.as_mut() {
                Some(joined) => {
                    joined.push_str(SEPARATOR);
                    joined.push_str(&msg.content);
                }
                None => system = Some(msg.content.clone()),
            },
            Role::User | Role::Assistant => turns.push(msg.clone()),
        }
    }

    (system, turns)
}
