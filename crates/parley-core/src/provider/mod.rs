mod gemini;

pub use gemini::GeminiProvider;

use crate::chat::Message;
use crate::error::ParleyError;

/// Reply text used when the provider fails.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// The completion provider trait. Given the conversation so far (ending with
/// the user's latest message), produce the assistant's reply text.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, context: &[Message]) -> Result<String, ParleyError>;
}
