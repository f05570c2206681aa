//! Text completion on top of any [`Generator`].

use std::sync::Arc;

use tracing::debug;

use crate::error::{ModelError, Result};
use crate::generator::{GenerationConfig, Generator};

const COMPLETION_INSTRUCTION: &str =
    "You are trained to analyze the text and complete the text based on the semantic understanding of text.";

/// Asks a generator to continue a fragment of text.
///
/// ```rust,ignore
/// let completer = TextCompleter::new(generator);
/// let text = completer.complete("I love eating mangoes in").await?;
/// ```
pub struct TextCompleter {
    generator: Arc<dyn Generator>,
    config: GenerationConfig,
}

impl TextCompleter {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            config: GenerationConfig::default().with_system_instruction(COMPLETION_INSTRUCTION),
        }
    }

    /// Replace the generation settings (the system instruction included).
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// The prompt sent for `text`.
    pub fn prompt(text: &str) -> String {
        format!(
            "Analyze the following text and based on the semantic understanding complete the text.\n\
             Return the answer by completing the text: {text}"
        )
    }

    /// Complete `text`, returning the generator's reply with surrounding
    /// whitespace removed.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidInput`] for blank input and propagates
    /// generator failures unchanged.
    pub async fn complete(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(ModelError::InvalidInput("text to complete must not be empty".into()));
        }

        debug!(generator = self.generator.name(), text_len = text.len(), "completing text");
        let reply = self.generator.generate_with_config(&Self::prompt(text), &self.config).await?;
        Ok(reply.trim().to_string())
    }
}
