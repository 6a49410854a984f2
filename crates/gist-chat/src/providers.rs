//! Language-model provider seam and the Responses API implementation.
//!
//! Streaming reads SSE from the API and yields text fragments in emission
//! order. Buffered calls parse the typed response body.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use reqwest::Client;
use tokio_stream::StreamExt;
use tracing::{debug, error, warn};

use crate::responses::{
    ErrorBody, InputMessage, ReasoningOptions, ResponseBody, ResponsesRequest, StreamEvent,
    TextOptions,
};
use crate::types::ChatMessage;
use gist_core::{Error, ReasoningEffort, Result};

/// Boxed stream type for returning different stream implementations.
pub type BoxedStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

/// A single streamed fragment, completion, or error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    Token(String),
    Done,
    Error(String),
}

/// Everything a provider needs for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub instructions: Option<String>,
    /// User and assistant turns, in conversation order.
    pub turns: Vec<ChatMessage>,
    pub max_output_tokens: u32,
    pub reasoning_effort: Option<ReasoningEffort>,
}

/// A hosted text-generation model.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Start a streaming generation. Failures arrive as `StreamChunk::Error`.
    fn stream(&self, request: GenerationRequest) -> BoxedStream;

    /// Run a generation to completion and return the concatenated output text.
    async fn complete(&self, request: GenerationRequest) -> Result<String>;
}

/// OpenAI Responses API client.
#[derive(Clone)]
pub struct OpenAiResponses {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiResponses {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.base_url)
    }

    fn body(request: GenerationRequest, stream: bool) -> ResponsesRequest {
        ResponsesRequest {
            model: request.model,
            input: request.turns.iter().map(InputMessage::from).collect(),
            instructions: request.instructions.filter(|s| !s.is_empty()),
            max_output_tokens: request.max_output_tokens,
            stream,
            text: TextOptions::default(),
            reasoning: request
                .reasoning_effort
                .map(|effort| ReasoningOptions { effort }),
        }
    }
}

/// Describe a non-2xx API response, preferring the structured error message.
fn api_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => format!("API error {}: {}", status, parsed.error.describe()),
        Err(_) => format!("API error {}: {}", status, body),
    }
}

/// Interpret one SSE `data:` payload. `None` means keep reading.
pub fn chunk_for_event(data: &str) -> Option<StreamChunk> {
    let event: StreamEvent = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(e) => {
            warn!("Skipping unparseable stream event: {}", e);
            return None;
        }
    };

    match event {
        StreamEvent::OutputTextDelta { delta } if delta.is_empty() => None,
        StreamEvent::OutputTextDelta { delta } => Some(StreamChunk::Token(delta)),
        StreamEvent::Completed => Some(StreamChunk::Done),
        StreamEvent::Unknown => None,
        other => {
            let message = other.failure_message().unwrap_or_else(|| "Unknown error".into());
            error!("Responses stream error: {}", message);
            Some(StreamChunk::Error(message))
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAiResponses {
    fn stream(&self, request: GenerationRequest) -> BoxedStream {
        let client = self.client.clone();
        let url = self.endpoint();
        let api_key = self.api_key.clone();
        let model = request.model.clone();
        let body = Self::body(request, true);

        Box::pin(async_stream::stream! {
            debug!("Streaming from {} with model {}", url, model);

            let response = match client
                .post(&url)
                .bearer_auth(&api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    yield StreamChunk::Error(format!("Request failed: {}", e));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                yield StreamChunk::Error(api_error(status, &body));
                return;
            }

            let mut stream = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(b) => b,
                    Err(e) => {
                        yield StreamChunk::Error(format!("Stream read error: {}", e));
                        return;
                    }
                };

                buffer.extend_from_slice(&bytes);

                // Decode only complete lines; a character may span two chunks
                while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
                    let raw: Vec<u8> = buffer.drain(..=line_end).collect();
                    let line = match std::str::from_utf8(&raw) {
                        Ok(text) => text.trim().to_string(),
                        Err(e) => {
                            yield StreamChunk::Error(format!("Invalid UTF-8 in stream: {}", e));
                            return;
                        }
                    };

                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    // "event:" lines repeat the payload's own type field
                    if let Some(data) = line.strip_prefix("data:") {
                        let data = data.trim_start();
                        if data == "[DONE]" {
                            yield StreamChunk::Done;
                            return;
                        }
                        match chunk_for_event(data) {
                            Some(StreamChunk::Token(text)) => yield StreamChunk::Token(text),
                            Some(terminal) => {
                                yield terminal;
                                return;
                            }
                            None => {}
                        }
                    }
                }
            }

            yield StreamChunk::Error("Stream ended before the response completed".into());
        })
    }

    async fn complete(&self, request: GenerationRequest) -> Result<String> {
        debug!("Requesting {} with model {}", self.endpoint(), request.model);
        let body = Self::body(request, false);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("Response read error: {}", e)))?;

        if !status.is_success() {
            return Err(Error::Provider(api_error(status, &text)));
        }

        let parsed: ResponseBody = serde_json::from_str(&text)
            .map_err(|e| Error::Provider(format!("Malformed response body: {}", e)))?;
        Ok(parsed.output_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    fn request(turn: &str) -> GenerationRequest {
        GenerationRequest {
            model: "gpt-5-nano".into(),
            instructions: Some("Be brief.".into()),
            turns: vec![ChatMessage::user(turn)],
            max_output_tokens: 64,
            reasoning_effort: None,
        }
    }

    async fn fake_responses(
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> axum::response::Response {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer sk-test") {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"code": "invalid_api_key", "message": "Incorrect API key"}})),
            )
                .into_response();
        }
        assert_eq!(body["instructions"], "Be brief.");
        assert_eq!(body["text"]["format"]["type"], "text");

        let prompt = body["input"][0]["content"].as_str().unwrap_or_default().to_string();
        if body["stream"] == json!(true) {
            let sse = match prompt.as_str() {
                "fail" => concat!(
                    "event: response.output_text.delta\n",
                    "data: {\"type\":\"response.output_text.delta\",\"delta\":\"par\"}\n\n",
                    "event: response.failed\n",
                    "data: {\"type\":\"response.failed\",\"response\":{\"error\":{\"code\":\"server_error\",\"message\":\"overloaded\"}}}\n\n",
                ),
                "truncated" => "data: {\"type\":\"response.output_text.delta\",\"delta\":\"x\"}\n\n",
                _ => concat!(
                    "event: response.created\n",
                    "data: {\"type\":\"response.created\",\"response\":{}}\n\n",
                    ": keep-alive\n\n",
                    "data: {\"type\":\"response.output_text.delta\",\"delta\":\"{\\\"title\\\"\"}\n\n",
                    "data: {\"type\":\"response.output_text.delta\",\"delta\":\"\"}\n\n",
                    "data: {\"type\":\"response.output_text.delta\",\"delta\":\": \\\"Toss\\\"}\"}\n\n",
                    "data: {\"type\":\"response.completed\",\"response\":{}}\n\n",
                ),
            };
            ([("content-type", "text/event-stream")], sse).into_response()
        } else {
            Json(json!({
                "output": [
                    {"type": "reasoning", "summary": []},
                    {"type": "message", "content": [{"type": "output_text", "text": format!("echo: {}", prompt)}]}
                ]
            }))
            .into_response()
        }
    }

    /// Sends one delta with its multi-byte `é` cut across two body chunks.
    async fn split_character() -> axum::response::Response {
        let events = concat!(
            "data: {\"type\":\"response.output_text.delta\",\"delta\":\"café\"}\n\n",
            "data: {\"type\":\"response.completed\",\"response\":{}}\n\n",
        )
        .as_bytes()
        .to_vec();
        let cut = events.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let (head, tail) = (events[..cut].to_vec(), events[cut..].to_vec());

        let body = async_stream::stream! {
            yield Ok::<_, std::io::Error>(head);
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            yield Ok(tail);
        };
        (
            [("content-type", "text/event-stream")],
            axum::body::Body::from_stream(body),
        )
            .into_response()
    }

    async fn serve() -> String {
        let app = Router::new()
            .route("/v1/responses", post(fake_responses))
            .route("/split/responses", post(split_character));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    async fn collect(stream: BoxedStream) -> Vec<StreamChunk> {
        stream.collect::<Vec<_>>().await
    }

    #[tokio::test]
    async fn test_stream_yields_fragments_in_order() {
        let provider = OpenAiResponses::new(Client::new(), &serve().await, "sk-test");
        let chunks = collect(provider.stream(request("toss a ball"))).await;
        assert_eq!(
            chunks,
            vec![
                StreamChunk::Token("{\"title\"".into()),
                StreamChunk::Token(": \"Toss\"}".into()),
                StreamChunk::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_character_split_across_chunks() {
        let base = serve().await.replace("/v1", "/split");
        let provider = OpenAiResponses::new(Client::new(), &base, "sk-test");
        let chunks = collect(provider.stream(request("café"))).await;
        assert_eq!(
            chunks,
            vec![StreamChunk::Token("café".into()), StreamChunk::Done]
        );
    }

    #[tokio::test]
    async fn test_stream_failure_event() {
        let provider = OpenAiResponses::new(Client::new(), &serve().await, "sk-test");
        let chunks = collect(provider.stream(request("fail"))).await;
        assert_eq!(
            chunks,
            vec![
                StreamChunk::Token("par".into()),
                StreamChunk::Error("server_error: overloaded".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_cut_short_is_an_error() {
        let provider = OpenAiResponses::new(Client::new(), &serve().await, "sk-test");
        let chunks = collect(provider.stream(request("truncated"))).await;
        assert_eq!(chunks.len(), 2);
        assert!(matches!(chunks[1], StreamChunk::Error(_)));
    }

    #[tokio::test]
    async fn test_stream_bad_key() {
        let provider = OpenAiResponses::new(Client::new(), &serve().await, "sk-wrong");
        let chunks = collect(provider.stream(request("toss a ball"))).await;
        match chunks.as_slice() {
            [StreamChunk::Error(message)] => {
                assert!(message.contains("401"));
                assert!(message.contains("Incorrect API key"));
            }
            other => panic!("unexpected chunks: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_concatenates_output_text() {
        let provider = OpenAiResponses::new(Client::new(), &serve().await, "sk-test");
        let text = provider.complete(request("toss a ball")).await.unwrap();
        assert_eq!(text, "echo: toss a ball");
    }

    #[tokio::test]
    async fn test_complete_bad_key_is_provider_error() {
        let provider = OpenAiResponses::new(Client::new(), &serve().await, "sk-wrong");
        let err = provider.complete(request("toss a ball")).await.unwrap_err();
        assert!(matches!(err, Error::Provider(ref m) if m.contains("invalid_api_key")));
    }

    #[test]
    fn test_chunk_for_event() {
        assert_eq!(
            chunk_for_event(r#"{"type":"response.output_text.delta","delta":"a"}"#),
            Some(StreamChunk::Token("a".into()))
        );
        assert_eq!(chunk_for_event(r#"{"type":"response.in_progress"}"#), None);
        assert_eq!(chunk_for_event("not json"), None);
        assert_eq!(
            chunk_for_event(r#"{"type":"error","message":"rate limited"}"#),
            Some(StreamChunk::Error("rate limited".into()))
        );
    }
}
