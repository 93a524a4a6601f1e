//! Chat-completion client for the estimator and the image classifier

use std::time::{Duration, Instant};

use async_stream::try_stream;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("Chat completion API key is not configured")]
    NotConfigured,
    #[error("Chat completion API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Chat completion transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Malformed chat completion response: {0}")]
    Decode(String),
}

impl OpenAiError {
    /// 429 or anything that reads like a rate limit
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Status { status, body } => {
                *status == 429 || body.to_lowercase().contains("rate")
            }
            _ => false,
        }
    }

    /// Rate limits, 5xx and transport failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Transport(_) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Parts(parts),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub max_completion_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Content deltas of a streamed completion, in arrival order
pub type DeltaStream = BoxStream<'static, Result<String, OpenAiError>>;

/// Extracts the delta text from one `data:` payload; `None` once `[DONE]` arrives
fn parse_sse_data(data: &str) -> Option<Result<String, OpenAiError>> {
    if data == "[DONE]" {
        return None;
    }
    let parsed = serde_json::from_str::<StreamChunk>(data)
        .map_err(|e| OpenAiError::Decode(e.to_string()))
        .map(|chunk| {
            chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .unwrap_or_default()
        });
    Some(parsed)
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_retries: u32,
}

impl OpenAiClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        max_retries: u32,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            max_retries,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn post(&self, request: &ChatRequest) -> Result<reqwest::Response, OpenAiError> {
        let api_key = self.api_key.as_deref().ok_or(OpenAiError::NotConfigured)?;
        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chat completion responded"
        );
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(OpenAiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Single non-streaming completion; callers own any retry policy
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, OpenAiError> {
        let response = self.post(request).await?;
        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| OpenAiError::Decode(e.to_string()))?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    /// Opens a streamed completion, retrying the open on rate limits, 5xx
    /// and transport failures with 1s, 2s, 4s... backoff.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<DeltaStream, OpenAiError> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            match self.post(request).await {
                Ok(response) => {
                    info!(attempt, "Chat completion stream opened");
                    return Ok(Self::deltas(response));
                }
                Err(err) if err.is_retryable() => {
                    warn!(attempt, error = %err, "Chat completion open failed, retrying");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_err.unwrap_or_else(|| OpenAiError::Decode("no attempts were made".into())))
    }

    fn deltas(response: reqwest::Response) -> DeltaStream {
        decode_event_stream(response.bytes_stream().boxed()).boxed()
    }
}

/// Splits a `text/event-stream` body into content deltas, stopping at `[DONE]`
fn decode_event_stream(
    mut bytes: BoxStream<'static, Result<Bytes, reqwest::Error>>,
) -> impl Stream<Item = Result<String, OpenAiError>> + Send {
    try_stream! {
        let mut buffer: Vec<u8> = Vec::new();
        'read: while let Some(chunk) = bytes.next().await {
            buffer.extend_from_slice(&chunk?);
            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&line);
                let Some(data) = line.trim().strip_prefix("data:") else {
                    continue;
                };
                match parse_sse_data(data.trim()) {
                    None => break 'read,
                    Some(delta) => {
                        let delta = delta?;
                        if !delta.is_empty() {
                            yield delta;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use futures::TryStreamExt;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(stream: bool) -> ChatRequest {
        ChatRequest {
            model: "gpt-test".into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            stream,
            max_completion_tokens: 64,
        }
    }

    fn client(server: &MockServer, retries: u32) -> OpenAiClient {
        OpenAiClient::new(reqwest::Client::new(), server.uri(), Some("sk-test".into()), retries)
    }

    const SSE_BODY: &str = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"Two \"}}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"excavators\"}}]}\n\n\
data: [DONE]\n\n";

    #[test]
    fn parses_sse_payloads() {
        assert!(parse_sse_data("[DONE]").is_none());
        let delta = parse_sse_data(r#"{"choices":[{"delta":{"content":"x"}}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(delta, "x");
        assert_matches!(parse_sse_data("{oops"), Some(Err(OpenAiError::Decode(_))));
    }

    #[test]
    fn serializes_image_parts() {
        let message = ChatMessage::user_parts(vec![
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: "data:image/png;base64,AA==".into() },
            },
            ContentPart::Text { text: "Classify".into() },
        ]);
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["content"][0]["type"], "image_url");
        assert_eq!(json["content"][0]["image_url"]["url"], "data:image/png;base64,AA==");
        assert_eq!(json["content"][1]["text"], "Classify");
    }

    #[tokio::test]
    async fn streams_content_deltas() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"stream": true, "max_completion_tokens": 64})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(SSE_BODY),
            )
            .mount(&server)
            .await;

        let deltas: Vec<String> = client(&server, 0)
            .stream_chat(&request(true))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(deltas, vec!["Two ".to_string(), "excavators".to_string()]);
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SSE_BODY))
            .mount(&server)
            .await;

        let stream = client(&server, 1).stream_chat(&request(true)).await;
        assert!(stream.is_ok());
    }

    #[tokio::test]
    async fn client_errors_fail_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad model"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, 3).stream_chat(&request(true)).await.err().unwrap();
        assert_matches!(err, OpenAiError::Status { status: 400, .. });
    }

    #[tokio::test]
    async fn completes_without_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"cat\": 5}"}}]
            })))
            .mount(&server)
            .await;

        let text = client(&server, 0).complete(&request(false)).await.unwrap();
        assert_eq!(text, "{\"cat\": 5}");
    }

    #[test]
    fn rate_limit_detection() {
        let err = OpenAiError::Status { status: 429, body: String::new() };
        assert!(err.is_rate_limited() && err.is_retryable());
        let err = OpenAiError::Status { status: 400, body: "Rate exceeded".into() };
        assert!(err.is_rate_limited());
        assert!(!err.is_retryable());
    }
}
