pub mod claude;
pub mod ollama;
pub mod traits;

pub use claude::Claude;
pub use ollama::Ollama;
pub use traits::{ChatBackend, ChatRequest, Message, MessageRole, TextStream};
