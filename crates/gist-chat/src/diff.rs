//! One-sentence change summaries between two simulation revisions.

use tracing::debug;

use crate::providers::{GenerationRequest, ModelProvider};
use crate::types::ChatMessage;
use gist_core::{ReasoningEffort, Result};

/// Prompt asking for a single sentence describing what changed from `old` to `new`.
pub fn comparison_prompt(old: &serde_json::Value, new: &serde_json::Value) -> Result<String> {
    let old = serde_json::to_string_pretty(old)?;
    let new = serde_json::to_string_pretty(new)?;

    Ok(format!(
        "Compare these two physics simulation JSON configurations and write a one-sentence \
         summary of the changes that were made.\n\
         \n\
         Old simulation JSON:\n\
         {old}\n\
         \n\
         New simulation JSON:\n\
         {new}\n\
         \n\
         Write a concise one-sentence summary describing what changed between the old and new simulation.\n\
         Focus on meaningful changes like objects added/removed, properties modified, controls changed, etc.\n\
         For example:\n\
         - \"Added a new box with initial velocity of 5 m/s\"\n\
         - \"Modified the default velocity of a ball to 10 m/s\"\n\
         - \"Moved the box slightly to the left\"\n\
         - \"Made the ball green instead of blue\"\n"
    ))
}

/// Settings for the summary call.
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    pub model: String,
    pub max_tokens: u32,
    pub reasoning_effort: Option<ReasoningEffort>,
}

/// Ask the model for the change summary and return it trimmed.
pub async fn summarize_changes(
    provider: &dyn ModelProvider,
    old: &serde_json::Value,
    new: &serde_json::Value,
    options: &SummaryOptions,
) -> Result<String> {
    let request = GenerationRequest {
        model: options.model.clone(),
        instructions: None,
        turns: vec![ChatMessage::user(comparison_prompt(old, new)?)],
        max_output_tokens: options.max_tokens,
        reasoning_effort: options.reasoning_effort,
    };

    let text = provider.complete(request).await?;
    let summary = text.trim().to_string();
    debug!("Change summary ({} chars) from {}", summary.len(), options.model);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{BoxedStream, StreamChunk};
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl ModelProvider for Echo {
        fn stream(&self, _request: GenerationRequest) -> BoxedStream {
            Box::pin(tokio_stream::iter(vec![StreamChunk::Done]))
        }

        async fn complete(&self, request: GenerationRequest) -> Result<String> {
            assert!(request.instructions.is_none());
            assert_eq!(request.max_output_tokens, 200);
            assert_eq!(request.turns.len(), 1);
            Ok("  Made the ball green instead of blue.\n".into())
        }
    }

    #[test]
    fn test_prompt_embeds_pretty_documents_in_order() {
        let old = json!({"objects": [{"id": "ball", "color": "#0000ff"}]});
        let new = json!({"objects": [{"id": "ball", "color": "#00ff00"}]});
        let prompt = comparison_prompt(&old, &new).unwrap();

        let old_at = prompt.find("Old simulation JSON:\n{\n  \"objects\"").unwrap();
        let new_at = prompt.find("New simulation JSON:\n").unwrap();
        assert!(old_at < new_at);
        assert!(prompt[old_at..new_at].contains("#0000ff"));
        assert!(prompt[new_at..].contains("#00ff00"));
        assert!(prompt.contains("one-sentence summary"));
    }

    #[tokio::test]
    async fn test_summary_is_trimmed() {
        let options = SummaryOptions {
            model: "gpt-5-mini".into(),
            max_tokens: 200,
            reasoning_effort: None,
        };
        let summary = summarize_changes(&Echo, &json!({}), &json!({"a": 1}), &options)
            .await
            .unwrap();
        assert_eq!(summary, "Made the ball green instead of blue.");
    }
}
