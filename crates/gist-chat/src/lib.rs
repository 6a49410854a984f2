//! Simulation-config generation over a hosted language model.
//!
//! Builds the instruction bundle, talks to the Responses API (streaming and
//! buffered), and relays model output as tagged envelopes.

pub mod diff;
pub mod instructions;
pub mod providers;
pub mod relay;
pub mod responses;
pub mod types;

pub use instructions::InstructionBundle;
pub use providers::{GenerationRequest, ModelProvider, OpenAiResponses, StreamChunk};
pub use types::*;
