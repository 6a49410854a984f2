//! Gist HTTP server: chat relays and simulation change summaries.

pub mod changes;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
