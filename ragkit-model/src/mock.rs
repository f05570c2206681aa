//! A scripted [`Generator`] for tests and key-less demos.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ModelError, Result};
use crate::generator::{GenerationConfig, Generator};

enum Behavior {
    Reply(String),
    Echo,
    Fail(String),
}

/// A [`Generator`] that answers from a script instead of a model.
///
/// Every prompt it receives is recorded and can be inspected with
/// [`prompts`](MockGenerator::prompts).
///
/// ```rust,ignore
/// let generator = MockGenerator::with_reply("positive");
/// assert_eq!(generator.generate("great film").await?, "positive");
/// assert_eq!(generator.prompts(), vec!["great film".to_string()]);
/// ```
pub struct MockGenerator {
    behavior: Behavior,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    /// Always answer with `reply`.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self { behavior: Behavior::Reply(reply.into()), prompts: Mutex::new(Vec::new()) }
    }

    /// Answer with the prompt itself.
    pub fn echo() -> Self {
        Self { behavior: Behavior::Echo, prompts: Mutex::new(Vec::new()) }
    }

    /// Fail every call with [`ModelError::ApiError`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self { behavior: Behavior::Fail(message.into()), prompts: Mutex::new(Vec::new()) }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        _config: &GenerationConfig,
    ) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match &self.behavior {
            Behavior::Reply(reply) => Ok(reply.clone()),
            Behavior::Echo => Ok(prompt.to_string()),
            Behavior::Fail(message) => {
                Err(ModelError::ApiError { provider: "mock".into(), message: message.clone() })
            }
        }
    }
}
