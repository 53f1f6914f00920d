pub mod gemini;

pub use gemini::{GeminiClient, LlmConfig, LlmError};

use async_trait::async_trait;

/// Plain-text generation: a prompt in, a free-text answer out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}
