//! Configuration for the retrieval pipeline.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::distance::DistanceMetric;
use crate::error::{RagError, Result};

/// Configuration parameters for the retrieval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum segment size in characters.
    pub chunk_size: usize,
    /// Number of characters shared by consecutive segments.
    pub chunk_overlap: usize,
    /// Preferred split point; `None` slices at fixed widths.
    pub separator: Option<String>,
    /// Distance the index ranks by.
    pub distance_metric: DistanceMetric,
    /// Number of results returned when a query does not say.
    pub top_k: usize,
    /// Maximum number of characters of retrieved text placed in a prompt.
    pub context_char_budget: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 100,
            separator: None,
            distance_metric: DistanceMetric::Cosine,
            top_k: 4,
            context_char_budget: 4000,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Load configuration from `RAG_*` environment variables.
    ///
    /// Unset variables keep their defaults; see [`RagConfig::from_env_with`].
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// Recognised variables: `RAG_CHUNK_SIZE`, `RAG_CHUNK_OVERLAP`,
    /// `RAG_CHUNK_SEPARATOR` (escape sequences `\n` and `\t` are expanded),
    /// `RAG_DISTANCE_METRIC`, `RAG_TOP_K`, `RAG_CONTEXT_CHAR_BUDGET`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a variable cannot be parsed or the
    /// resulting configuration is invalid.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = RagConfig::builder();

        if let Some(size) = parse_var::<usize>(&lookup, "RAG_CHUNK_SIZE")? {
            builder = builder.chunk_size(size);
        }
        if let Some(overlap) = parse_var::<usize>(&lookup, "RAG_CHUNK_OVERLAP")? {
            builder = builder.chunk_overlap(overlap);
        }
        if let Some(separator) = lookup("RAG_CHUNK_SEPARATOR") {
            builder = builder.separator(separator.replace("\\n", "\n").replace("\\t", "\t"));
        }
        if let Some(metric) = lookup("RAG_DISTANCE_METRIC") {
            builder = builder.distance_metric(metric.parse()?);
        }
        if let Some(k) = parse_var::<usize>(&lookup, "RAG_TOP_K")? {
            builder = builder.top_k(k);
        }
        if let Some(budget) = parse_var::<usize>(&lookup, "RAG_CONTEXT_CHAR_BUDGET")? {
            builder = builder.context_char_budget(budget);
        }

        builder.build()
    }

    /// Check that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `context_char_budget == 0`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.context_char_budget == 0 {
            return Err(RagError::ConfigError(
                "context_char_budget must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| RagError::ConfigError(format!("{key}='{raw}' is not valid: {e}"))),
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum segment size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive segments in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Prefer splitting right after `separator`. An empty string means none.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        self.config.separator = if separator.is_empty() { None } else { Some(separator) };
        self
    }

    /// Set the distance the index ranks by.
    pub fn distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.config.distance_metric = metric;
        self
    }

    /// Set the number of results returned when a query does not say.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the character budget for prompt context.
    pub fn context_char_budget(mut self, budget: usize) -> Self {
        self.config.context_char_budget = budget;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
