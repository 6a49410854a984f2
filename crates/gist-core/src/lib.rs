//! Gist Core: shared configuration and error types.

pub mod config;
pub mod error;

pub use config::{GistConfig, ModelDefaults, ReasoningEffort, StoreConfig};
pub use error::{Error, Result};
