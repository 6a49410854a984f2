//! Change summaries for a simulation relative to its parent revision.

use tracing::{debug, info};

use crate::state::AppState;
use gist_chat::diff::summarize_changes;
use gist_core::{Error, Result};

pub const NO_PARENT_MESSAGE: &str = "No parent simulation, skipping changes_made update";

/// Terminal outcome of a summary run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangesOutcome {
    /// Root of its history; nothing to compare against.
    NoParent,
    Updated {
        simulation_id: i64,
        changes_made: String,
    },
}

/// Summarize how simulation `id` differs from its parent and store the sentence
/// in its `changes_made` field.
///
/// The only write happens after both documents are read and the model answers.
pub async fn update_changes_made(state: &AppState, id: i64) -> Result<ChangesOutcome> {
    let record = state
        .store
        .get_simulation(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Simulation {} not found", id)))?;

    let Some(parent_id) = record.parent_id else {
        debug!("Simulation {} has no parent", id);
        return Ok(ChangesOutcome::NoParent);
    };

    let parent_json = state
        .store
        .get_simulation_json(parent_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Parent simulation {} not found", parent_id)))?;

    let summary = summarize_changes(
        state.provider.as_ref(),
        &parent_json,
        &record.json,
        &state.summary_options(),
    )
    .await?;

    if !state.store.update_changes_made(id, &summary).await? {
        return Err(Error::NotFound(format!("Simulation {} not found", id)));
    }

    info!("Updated changes_made for simulation {}", id);
    Ok(ChangesOutcome::Updated {
        simulation_id: id,
        changes_made: summary,
    })
}
