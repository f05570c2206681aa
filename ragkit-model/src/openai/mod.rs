//! OpenAI chat completion backend.
//!
//! This module is only available when the `openai` feature is enabled.
//!
//! ```rust,ignore
//! use ragkit_model::openai::{OpenAIConfig, OpenAIGenerator};
//!
//! let generator = OpenAIGenerator::new(OpenAIConfig::new(api_key, "gpt-3.5-turbo"))?;
//! let reply = generator.generate("Complete: I love eating mangoes in").await?;
//! ```

mod client;
mod config;

pub use client::OpenAIGenerator;
pub use config::{DEFAULT_MODEL, OpenAIConfig};
