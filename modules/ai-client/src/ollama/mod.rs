use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::traits::{ChatBackend, ChatRequest, MessageRole, TextStream};

const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Local generative backend speaking the Ollama chat API. Responses
/// arrive as newline-delimited JSON chunks.
#[derive(Clone)]
pub struct Ollama {
    model: String,
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

impl Ollama {
    pub fn new(base_url: &str, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn local(model: impl Into<String>) -> Self {
        Self::new(OLLAMA_DEFAULT_URL, model)
    }

    fn wire_request(&self, request: &ChatRequest) -> OllamaChatRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| OllamaMessage {
                role: match m.role {
                    MessageRole::System => "system".to_string(),
                    MessageRole::User => "user".to_string(),
                    MessageRole::Assistant => "assistant".to_string(),
                },
                content: m.content.clone(),
            })
            .collect();

        OllamaChatRequest {
            model: self.model.clone(),
            messages,
            stream: true,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

#[async_trait]
impl ChatBackend for Ollama {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<TextStream> {
        let url = format!("{}/api/chat", self.base_url);
        let wire = self.wire_request(&request);

        debug!(model = %wire.model, "Ollama stream request");

        let response = self.http.post(&url).json(&wire).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Ollama API error ({}): {}", status, error_text));
        }

        let mut bytes = response.bytes_stream();

        let stream = async_stream::try_stream! {
            let mut buffer = String::new();
            'outer: while let Some(chunk) = bytes.next().await {
                let chunk = chunk?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer.drain(..=newline);
                    if line.is_empty() {
                        continue;
                    }

                    let parsed: OllamaChunk = match serde_json::from_str(&line) {
                        Ok(parsed) => parsed,
                        Err(_) => continue,
                    };
                    if let Some(error) = parsed.error {
                        Err(anyhow!("Ollama stream error: {error}"))?;
                    }
                    if let Some(message) = parsed.message {
                        if !message.content.is_empty() {
                            yield message.content;
                        }
                    }
                    if parsed.done {
                        break 'outer;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
