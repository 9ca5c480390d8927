//! Text Generation Backends
//!
//! Phases talk to language models only through [`TextGenerator`]: one
//! prompt in, one string out. Real providers live outside this crate.

use async_trait::async_trait;
use log::debug;

use crate::error::GeneratorError;

/// A backend that turns a prompt into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

/// Offline backend that answers with a digest of the prompt.
///
/// Output is deterministic, which makes it usable for dry runs and tests.
#[derive(Debug, Clone)]
pub struct EchoGenerator {
    max_chars: usize,
}

impl EchoGenerator {
    pub fn new() -> Self {
        Self { max_chars: 200 }
    }

    /// Limits how much of the prompt is echoed back.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }
}

impl Default for EchoGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GeneratorError::Rejected("empty prompt".to_string()));
        }

        let collapsed = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
        let echoed: String = collapsed.chars().take(self.max_chars).collect();
        debug!("Echo backend answering {} prompt chars", collapsed.chars().count());

        Ok(format!("[echo] {}", echoed))
    }
}
