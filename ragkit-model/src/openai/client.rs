//! OpenAI client implementation.

use async_openai::{
    Client,
    config::OpenAIConfig as AsyncOpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use tracing::{debug, error};

use super::config::OpenAIConfig;
use crate::error::{ModelError, Result};
use crate::generator::{GenerationConfig, Generator};

const PROVIDER: &str = "OpenAI";

/// [`Generator`] backed by the OpenAI chat completions API or any
/// OpenAI-compatible server.
///
/// Every call requests a single choice and returns its message content.
pub struct OpenAIGenerator {
    client: Client<AsyncOpenAIConfig>,
    model: String,
}

impl OpenAIGenerator {
    /// Create a new OpenAI generator.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(ModelError::ConfigError("API key must not be empty".into()));
        }
        if config.model.is_empty() {
            return Err(ModelError::ConfigError("model must not be empty".into()));
        }

        let mut openai_config = AsyncOpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(org_id) = &config.organization_id {
            openai_config = openai_config.with_org_id(org_id);
        }

        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Ok(Self { client: Client::with_config(openai_config), model: config.model })
    }

    /// Create a generator for an OpenAI-compatible API.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        Self::new(OpenAIConfig::compatible(api_key, base_url, model))
    }

    fn api_error(context: &str, e: impl std::fmt::Display) -> ModelError {
        ModelError::ApiError { provider: PROVIDER.into(), message: format!("{context}: {e}") }
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);
        if let Some(instruction) = &config.system_instruction {
            let system = ChatCompletionRequestSystemMessageArgs::default()
                .content(instruction.as_str())
                .build()
                .map_err(|e| Self::api_error("failed to build system message", e))?;
            messages.push(system.into());
        }
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| Self::api_error("failed to build user message", e))?;
        messages.push(user.into());

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model).messages(messages).n(1);
        if let Some(temperature) = config.temperature {
            request_builder.temperature(temperature);
        }
        if let Some(max_tokens) = config.max_output_tokens {
            request_builder.max_completion_tokens(max_tokens);
        }

        let request =
            request_builder.build().map_err(|e| Self::api_error("failed to build request", e))?;

        debug!(provider = PROVIDER, model = %self.model, prompt_len = prompt.len(), "sending chat completion");

        let response = self.client.chat().create(request).await.map_err(|e| {
            error!(provider = PROVIDER, model = %self.model, error = %e, "chat completion failed");
            Self::api_error("API error", e)
        })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ModelError::EmptyResponse { provider: PROVIDER.into() })
    }
}
