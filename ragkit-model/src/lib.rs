//! # ragkit-model
//!
//! Text generation for ragkit.
//!
//! ## Overview
//!
//! - [`Generator`] - the capability every backend implements: prompt in, text out
//! - [`OpenAIGenerator`] - OpenAI chat completion (feature `openai`)
//! - [`MockGenerator`] - canned replies for tests and offline demos
//! - [`TextCompleter`] - asks a generator to continue a piece of text
//! - [`SentimentClassifier`] - labels reviews as positive or negative
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragkit_model::openai::{OpenAIConfig, OpenAIGenerator};
//! use ragkit_model::{SentimentClassifier, Sentiment};
//! use std::sync::Arc;
//!
//! let generator = OpenAIGenerator::new(OpenAIConfig::from_env()?)?;
//! let classifier = SentimentClassifier::new(Arc::new(generator));
//! assert_eq!(classifier.classify("Loved every minute").await?, Sentiment::Positive);
//! ```

pub mod completion;
pub mod error;
pub mod generator;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
pub mod sentiment;

pub use completion::TextCompleter;
pub use error::{ModelError, Result};
pub use generator::{GenerationConfig, Generator};
pub use mock::MockGenerator;
#[cfg(feature = "openai")]
pub use openai::{OpenAIConfig, OpenAIGenerator};
pub use sentiment::{Sentiment, SentimentClassifier, SentimentTally};
