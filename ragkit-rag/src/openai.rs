//! OpenAI embeddings backend.
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::Embedding;
use crate::embedding::Embedder;
use crate::error::{RagError, Result};

const PROVIDER: &str = "OpenAI";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const DEFAULT_MODEL: &str = "text-embedding-ada-002";

/// Output size of `text-embedding-ada-002`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// An [`Embedder`] calling the `/embeddings` endpoint of the OpenAI API, or
/// of any server that speaks the same protocol.
///
/// One request is sent per batch. Failures are returned as
/// [`RagError::EmbeddingUnavailable`] and never retried.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_rag::openai::OpenAIEmbedder;
///
/// let embedder = OpenAIEmbedder::from_env()?
///     .with_model("text-embedding-3-small")
///     .with_dimensions(512);
/// let vector = embedder.embed("hello world").await?;
/// ```
#[derive(Debug, Clone)]
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    /// Sent to the API so models that support it shorten their output.
    request_dimensions: Option<usize>,
}

impl OpenAIEmbedder {
    /// Create an embedder for the default model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `api_key` is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::ConfigError("OpenAI API key must not be empty".into()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
        })
    }

    /// Create an embedder from `OPENAI_API_KEY`, honouring `OPENAI_BASE_URL`
    /// when it is set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::ConfigError("OPENAI_API_KEY environment variable not set".into())
        })?;
        let embedder = Self::new(api_key)?;
        Ok(match std::env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => embedder.with_base_url(url),
            _ => embedder,
        })
    }

    /// Point at an OpenAI-compatible server, e.g. `http://localhost:8080/v1`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Ask the API for vectors of `dims` components.
    ///
    /// This also updates [`dimensions()`](Embedder::dimensions).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn unavailable(message: String) -> RagError {
        RagError::EmbeddingUnavailable { provider: PROVIDER.into(), message }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let vectors = self.embed_batch(&[text]).await?;
        vectors.into_iter().next().ok_or_else(|| Self::unavailable("API returned no embedding".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.request_dimensions,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                Self::unavailable(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(Self::unavailable(format!("API returned {status}: {detail}")));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            Self::unavailable(format!("failed to parse response: {e}"))
        })?;

        if parsed.data.len() != texts.len() {
            return Err(Self::unavailable(format!(
                "API returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }
        // the API tags each vector with its input position
        parsed.data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));

        let vectors: Vec<Embedding> = parsed.data.into_iter().map(|d| d.embedding).collect();
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(Self::unavailable(format!(
                "API returned a {}-dimensional vector, expected {}",
                bad.len(),
                self.dimensions
            )));
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_key() {
        assert!(matches!(OpenAIEmbedder::new("  "), Err(RagError::ConfigError(_))));
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let embedder = OpenAIEmbedder::new("sk-test").unwrap().with_base_url("http://localhost:8080/v1/");
        assert_eq!(embedder.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn dimensions_override() {
        let embedder = OpenAIEmbedder::new("sk-test").unwrap().with_dimensions(256);
        assert_eq!(embedder.dimensions(), 256);
        assert_eq!(embedder.request_dimensions, Some(256));
    }
}
