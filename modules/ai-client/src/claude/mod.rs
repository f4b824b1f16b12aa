pub(crate) mod types;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use crate::traits::{ChatBackend, ChatRequest, MessageRole, TextStream};
use types::*;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages backend with SSE streaming.
#[derive(Clone)]
pub struct Claude {
    api_key: String,
    model: String,
    http: reqwest::Client,
    base_url: String,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            http: reqwest::Client::new(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow!("ANTHROPIC_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Fold the generic message list into the Anthropic wire shape:
    /// system messages join the top-level `system` field, the rest
    /// become user/assistant turns.
    fn wire_request(&self, request: &ChatRequest) -> StreamChatRequest {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut messages = Vec::new();
        for message in &request.messages {
            match message.role {
                MessageRole::System => system_parts.push(&message.content),
                MessageRole::User => messages.push(WireMessage {
                    role: Role::User,
                    content: message.content.clone(),
                }),
                MessageRole::Assistant => messages.push(WireMessage {
                    role: Role::Assistant,
                    content: message.content.clone(),
                }),
            }
        }

        StreamChatRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            messages,
            system: if system_parts.is_empty() {
                None
            } else {
                Some(system_parts.join("\n\n"))
            },
            temperature: Some(request.temperature),
            stream: true,
        }
    }
}

#[async_trait]
impl ChatBackend for Claude {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<TextStream> {
        let url = format!("{}/messages", self.base_url);
        let wire = self.wire_request(&request);

        debug!(model = %wire.model, max_tokens = wire.max_tokens, "Claude stream request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&wire)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Claude API error ({}): {}", status, error_text));
        }

        let mut bytes = response.bytes_stream();

        let stream = async_stream::try_stream! {
            let mut buffer = String::new();
            'outer: while let Some(chunk) = bytes.next().await {
                let chunk = chunk?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // SSE frames are newline-delimited; hold back the last
                // partial line until more bytes arrive.
                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer.drain(..=newline);

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    let event: StreamEvent = match serde_json::from_str(data) {
                        Ok(event) => event,
                        Err(_) => continue,
                    };
                    match event {
                        StreamEvent::ContentBlockDelta {
                            delta: Delta::TextDelta { text },
                        } => yield text,
                        StreamEvent::ContentBlockDelta { .. } => {}
                        StreamEvent::MessageStop => break 'outer,
                        StreamEvent::Error { error } => {
                            Err(anyhow!("Claude stream error: {}", error.message))?;
                        }
                        StreamEvent::Other => {}
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
