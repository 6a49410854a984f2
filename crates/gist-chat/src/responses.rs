//! Wire types for the Responses API.
//!
//! Only the shapes this service reads are modelled; everything else falls
//! into an `Other`/`Unknown` variant and is ignored.

use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, Role};
use gist_core::ReasoningEffort;

/// Request body for `POST /responses`.
#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<InputMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub max_output_tokens: u32,
    pub stream: bool,
    pub text: TextOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningOptions>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputMessage {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub role: Role,
    pub content: String,
}

impl From<&ChatMessage> for InputMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            kind: "message",
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TextOptions {
    pub format: TextFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            format: TextFormat { kind: "text" },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReasoningOptions {
    pub effort: ReasoningEffort,
}

/// Non-streaming response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseBody {
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<ContentPart>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    OutputText { text: String },
    #[serde(other)]
    Other,
}

impl ResponseBody {
    /// Every `output_text` part of every message item, in order.
    pub fn output_text(&self) -> String {
        let mut text = String::new();
        for item in &self.output {
            match item {
                OutputItem::Message { content } => {
                    for part in content {
                        match part {
                            ContentPart::OutputText { text: t } => text.push_str(t),
                            ContentPart::Other => {}
                        }
                    }
                }
                OutputItem::Other => {}
            }
        }
        text
    }
}

/// One `data:` payload of the streaming response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        #[serde(default)]
        delta: String,
    },
    #[serde(rename = "response.completed")]
    Completed,
    #[serde(rename = "response.failed")]
    Failed {
        #[serde(default)]
        response: Option<FailedResponse>,
    },
    #[serde(rename = "response.incomplete")]
    Incomplete {
        #[serde(default)]
        response: Option<FailedResponse>,
    },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        code: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct FailedResponse {
    #[serde(default)]
    pub error: Option<ApiError>,
    #[serde(default)]
    pub incomplete_details: Option<IncompleteDetails>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncompleteDetails {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Error envelope of a non-2xx API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: ApiError,
}

impl ApiError {
    pub fn describe(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (None, Some(message)) => message.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "Unknown error".into(),
        }
    }
}

impl StreamEvent {
    /// Human-readable failure message for terminal error events.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            StreamEvent::Failed { response } => Some(
                response
                    .as_ref()
                    .and_then(|r| r.error.as_ref())
                    .map(ApiError::describe)
                    .unwrap_or_else(|| "Response failed".into()),
            ),
            StreamEvent::Incomplete { response } => {
                let reason = response
                    .as_ref()
                    .and_then(|r| r.incomplete_details.as_ref())
                    .and_then(|d| d.reason.clone())
                    .unwrap_or_else(|| "unknown".into());
                Some(format!("Response incomplete: {}", reason))
            }
            StreamEvent::Error { message, code } => Some(
                ApiError {
                    code: code.clone(),
                    message: message.clone(),
                }
                .describe(),
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let req = ResponsesRequest {
            model: "gpt-5-mini".into(),
            input: vec![InputMessage::from(&ChatMessage::user("toss a ball"))],
            instructions: None,
            max_output_tokens: 200,
            stream: false,
            text: TextOptions::default(),
            reasoning: Some(ReasoningOptions {
                effort: ReasoningEffort::Minimal,
            }),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "model": "gpt-5-mini",
                "input": [{"type": "message", "role": "user", "content": "toss a ball"}],
                "max_output_tokens": 200,
                "stream": false,
                "text": {"format": {"type": "text"}},
                "reasoning": {"effort": "minimal"},
            })
        );
    }

    #[test]
    fn test_output_text_skips_unknown_shapes() {
        let body: ResponseBody = serde_json::from_value(json!({
            "id": "resp_1",
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "role": "assistant", "content": [
                    {"type": "output_text", "text": "{\"title\": ", "annotations": []},
                    {"type": "refusal", "refusal": "no"},
                    {"type": "output_text", "text": "\"Toss Ball\"}"}
                ]},
                {"type": "message", "content": [{"type": "output_text", "text": "\n"}]}
            ]
        }))
        .unwrap();
        assert_eq!(body.output_text(), "{\"title\": \"Toss Ball\"}\n");
    }

    #[test]
    fn test_missing_output_is_empty() {
        let body: ResponseBody = serde_json::from_value(json!({"id": "resp_2"})).unwrap();
        assert_eq!(body.output_text(), "");
    }

    #[test]
    fn test_stream_event_variants() {
        let delta: StreamEvent = serde_json::from_value(json!({
            "type": "response.output_text.delta", "item_id": "msg_1", "delta": "Hel"
        }))
        .unwrap();
        assert_eq!(delta, StreamEvent::OutputTextDelta { delta: "Hel".into() });

        let created: StreamEvent =
            serde_json::from_value(json!({"type": "response.created", "response": {}})).unwrap();
        assert_eq!(created, StreamEvent::Unknown);

        let failed: StreamEvent = serde_json::from_value(json!({
            "type": "response.failed",
            "response": {"error": {"code": "server_error", "message": "overloaded"}}
        }))
        .unwrap();
        assert_eq!(failed.failure_message().as_deref(), Some("server_error: overloaded"));

        let incomplete: StreamEvent = serde_json::from_value(json!({
            "type": "response.incomplete",
            "response": {"incomplete_details": {"reason": "max_output_tokens"}}
        }))
        .unwrap();
        assert_eq!(
            incomplete.failure_message().as_deref(),
            Some("Response incomplete: max_output_tokens")
        );

        assert_eq!(StreamEvent::Completed.failure_message(), None);
    }
}
