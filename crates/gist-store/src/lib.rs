//! Gist Store: simulation records with a version-history parent link.

pub mod postgrest;
pub mod schema;
pub mod sqlite;
pub mod store;
pub mod types;

pub use postgrest::PostgrestStore;
pub use sqlite::SqliteStore;
pub use store::SimulationStore;
pub use types::*;
