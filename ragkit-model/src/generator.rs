//! The text generation capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Per-request generation settings.
///
/// The default is deterministic decoding (`temperature = 0`) with no system
/// instruction and no output cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Instruction sent ahead of the prompt as a system message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { system_instruction: None, temperature: Some(0.0), max_output_tokens: None }
    }
}

impl GenerationConfig {
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_tokens);
        self
    }
}

/// A backend that turns a prompt into text.
///
/// Implementations return exactly one completion per call. Failures are
/// reported as-is; callers own any retry policy.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_model::Generator;
///
/// let reply = generator.generate("Say hello").await?;
/// ```
#[async_trait]
pub trait Generator: Send + Sync {
    /// A short identifier for the backend or model, used in logs.
    fn name(&self) -> &str;

    /// Generate text for `prompt` with explicit settings.
    async fn generate_with_config(&self, prompt: &str, config: &GenerationConfig)
    -> Result<String>;

    /// Generate text for `prompt` with [`GenerationConfig::default`].
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_config(prompt, &GenerationConfig::default()).await
    }
}
