//! Shared application state.

use std::sync::Arc;

use gist_chat::diff::SummaryOptions;
use gist_chat::relay::RelayOptions;
use gist_chat::{InstructionBundle, ModelProvider, OpenAiResponses};
use gist_core::{GistConfig, Result, StoreConfig};
use gist_store::{PostgrestStore, SimulationStore, SqliteStore};
use tracing::info;

/// Shared application state accessible from all route handlers.
///
/// Everything here is read-only after startup.
pub struct AppState {
    pub config: GistConfig,
    pub bundle: InstructionBundle,
    pub provider: Arc<dyn ModelProvider>,
    pub store: Arc<dyn SimulationStore>,
}

impl AppState {
    pub fn new(
        config: GistConfig,
        bundle: InstructionBundle,
        provider: Arc<dyn ModelProvider>,
        store: Arc<dyn SimulationStore>,
    ) -> Self {
        Self {
            config,
            bundle,
            provider,
            store,
        }
    }

    /// Wire up the Responses API client and the configured store.
    pub fn from_config(config: GistConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let bundle = InstructionBundle::load(config.schema_path.as_deref())?;

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| gist_core::Error::Http(e.to_string()))?;

        let provider: Arc<dyn ModelProvider> = Arc::new(OpenAiResponses::new(
            client.clone(),
            &config.openai_base_url,
            &api_key,
        ));

        let store: Arc<dyn SimulationStore> = match &config.store {
            StoreConfig::Sqlite { path } => Arc::new(SqliteStore::open(path)?),
            StoreConfig::Postgrest { url, service_key } => {
                info!("Using PostgREST store at {}", url);
                Arc::new(PostgrestStore::new(client, url, service_key))
            }
        };

        Ok(Self::new(config, bundle, provider, store))
    }

    /// Generation settings for the streaming relay.
    pub fn stream_options(&self, model: Option<String>, max_tokens: Option<u32>) -> RelayOptions {
        RelayOptions {
            model: model.unwrap_or_else(|| self.config.models.stream_model.clone()),
            max_tokens: max_tokens.unwrap_or(self.config.models.max_tokens),
            reasoning_effort: self.config.models.reasoning_effort,
        }
    }

    /// Generation settings for the buffered relay.
    pub fn chat_options(&self, model: Option<String>, max_tokens: Option<u32>) -> RelayOptions {
        RelayOptions {
            model: model.unwrap_or_else(|| self.config.models.chat_model.clone()),
            max_tokens: max_tokens.unwrap_or(self.config.models.max_tokens),
            reasoning_effort: self.config.models.reasoning_effort,
        }
    }

    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            model: self.config.models.summary_model.clone(),
            max_tokens: self.config.models.summary_max_tokens,
            reasoning_effort: self.config.models.reasoning_effort,
        }
    }

    /// The bundle is only sent on the streaming route when configured to.
    pub fn stream_bundle(&self) -> Option<&InstructionBundle> {
        self.config.stream_instructions.then_some(&self.bundle)
    }
}
