use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;

// =============================================================================
// Message Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Chat Request
// =============================================================================

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatRequest {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            max_tokens: 1024,
            temperature: 0.0,
        }
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ChatBackend Trait
// =============================================================================

/// A finite, non-restartable stream of response text deltas.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A generative backend, local or remote. Backends deliver the
/// response incrementally; callers accumulate the deltas into one
/// buffer before any parsing.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Model identifier recorded in artifacts.
    fn model(&self) -> &str;

    /// Start a chat completion, returning the delta stream.
    async fn chat_stream(&self, request: ChatRequest) -> Result<TextStream>;
}
