//! Review sentiment classification on top of any [`Generator`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ModelError, Result};
use crate::generator::{GenerationConfig, Generator};

const SENTIMENT_INSTRUCTION: &str = "You are trained to analyze and detect the sentiment of given text. \
If you're unsure of an answer, you can say \"not sure\" and recommend users to review manually.";

/// The label assigned to a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    /// The model declined to answer or replied with something else.
    Unsure,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Unsure => "unsure",
        }
    }

    /// Interpret a model reply.
    ///
    /// Only the first word counts, case-insensitively, and a prefix is enough
    /// (`"pos"` is positive) since replies are capped to a single token.
    pub fn from_reply(reply: &str) -> Self {
        let word = reply
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();

        if word.len() >= 3 && "positive".starts_with(&word) {
            Sentiment::Positive
        } else if word.len() >= 3 && "negative".starts_with(&word) {
            Sentiment::Negative
        } else {
            Sentiment::Unsure
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels text as positive or negative with one generator call per text.
///
/// ```rust,ignore
/// let classifier = SentimentClassifier::new(generator);
/// let label = classifier.classify("The plot made no sense.").await?;
/// ```
pub struct SentimentClassifier {
    generator: Arc<dyn Generator>,
    config: GenerationConfig,
}

impl SentimentClassifier {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            config: GenerationConfig::default()
                .with_system_instruction(SENTIMENT_INSTRUCTION)
                .with_max_output_tokens(1),
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
            "Analyze the following product review and determine if the sentiment is: positive or negative. \
             Return the answer in a single word as either positive or negative: {text}"
        )
    }

    /// Classify one text.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidInput`] for blank text and propagates
    /// generator failures unchanged.
    pub async fn classify(&self, text: &str) -> Result<Sentiment> {
        if text.trim().is_empty() {
            return Err(ModelError::InvalidInput("review text must not be empty".into()));
        }

        let reply = self.generator.generate_with_config(&Self::prompt(text), &self.config).await?;
        let sentiment = Sentiment::from_reply(&reply);
        debug!(generator = self.generator.name(), reply = %reply.trim(), %sentiment, "classified text");
        Ok(sentiment)
    }

    /// Classify every text in order, stopping at the first failure.
    pub async fn classify_all(&self, texts: &[&str]) -> Result<Vec<Sentiment>> {
        let mut labels = Vec::with_capacity(texts.len());
        for text in texts {
            labels.push(self.classify(text).await?);
        }
        info!(count = labels.len(), "classified batch");
        Ok(labels)
    }
}

/// Counts of (expected label, prediction) pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentimentTally {
    counts: BTreeMap<(String, Sentiment), usize>,
}

impl SentimentTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one prediction against its expected label (compared lowercase).
    pub fn record(&mut self, expected: &str, predicted: Sentiment) {
        *self.counts.entry((expected.trim().to_lowercase(), predicted)).or_default() += 1;
    }

    pub fn count(&self, expected: &str, predicted: Sentiment) -> usize {
        self.counts.get(&(expected.trim().to_lowercase(), predicted)).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Fraction of predictions equal to their expected label, `None` when empty.
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let correct: usize = self
            .counts
            .iter()
            .filter(|((expected, predicted), _)| expected == predicted.as_str())
            .map(|(_, n)| n)
            .sum();
        Some(correct as f64 / total as f64)
    }

    /// Pairs ordered by expected label then prediction.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Sentiment, usize)> {
        self.counts.iter().map(|((expected, predicted), n)| (expected.as_str(), *predicted, *n))
    }
}
