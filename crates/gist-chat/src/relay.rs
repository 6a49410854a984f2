//! Streaming and buffered chat relays.

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::instructions::{split_system, InstructionBundle};
use crate::providers::{GenerationRequest, ModelProvider, StreamChunk};
use crate::types::{ChatMessage, ChatReply, Envelope};
use gist_core::ReasoningEffort;

pub type EnvelopeStream = Pin<Box<dyn Stream<Item = Envelope> + Send>>;

/// Per-call generation settings resolved from the request and configuration.
#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub model: String,
    pub max_tokens: u32,
    pub reasoning_effort: Option<ReasoningEffort>,
}

/// Build the provider request for a conversation.
///
/// With a bundle, caller system text is appended after it; without one the
/// caller's system text alone becomes the instructions.
pub fn build_request(
    messages: &[ChatMessage],
    bundle: Option<&InstructionBundle>,
    options: &RelayOptions,
) -> GenerationRequest {
    let (system, turns) = split_system(messages);
    let instructions = match bundle {
        Some(bundle) => Some(bundle.extended_with(system.as_deref())),
        None => system,
    };

    GenerationRequest {
        model: options.model.clone(),
        instructions,
        turns,
        max_output_tokens: options.max_tokens,
        reasoning_effort: options.reasoning_effort,
    }
}

/// Relay a streaming generation as envelopes.
///
/// Fragments pass through in provider order. The stream always ends with
/// exactly one `done` or `error` envelope.
pub fn stream_relay(provider: Arc<dyn ModelProvider>, request: GenerationRequest) -> EnvelopeStream {
    let model = request.model.clone();
    let upstream = provider.stream(request);

    Box::pin(async_stream::stream! {
        tokio::pin!(upstream);
        let mut fragments = 0usize;

        while let Some(chunk) = upstream.next().await {
            match chunk {
                StreamChunk::Token(text) if text.is_empty() => {}
                StreamChunk::Token(text) => {
                    fragments += 1;
                    yield Envelope::Content { content: text };
                }
                StreamChunk::Done => {
                    debug!("Relayed {} fragments from {}", fragments, model);
                    yield Envelope::Done;
                    return;
                }
                StreamChunk::Error(error) => {
                    warn!("Stream from {} failed after {} fragments: {}", model, fragments, error);
                    yield Envelope::Error { error };
                    return;
                }
            }
        }

        yield Envelope::Error {
            error: "Model stream ended unexpectedly".into(),
        };
    })
}

/// Run a generation to completion with the instruction bundle prepended.
pub async fn buffered_relay(
    provider: &dyn ModelProvider,
    bundle: &InstructionBundle,
    messages: &[ChatMessage],
    options: &RelayOptions,
) -> ChatReply {
    let request = build_request(messages, Some(bundle), options);
    match provider.complete(request).await {
        Ok(content) => ChatReply::Success { content },
        Err(e) => {
            warn!("Buffered generation with {} failed: {}", options.model, e);
            ChatReply::Error {
                error: e.to_string(),
            }
        }
    }
}
