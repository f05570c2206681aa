//! Question-answering prompt template.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

const CONTEXT_PLACEHOLDER: &str = "{context}";
const QUESTION_PLACEHOLDER: &str = "{question}";

const DEFAULT_TEMPLATE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.

{context}

Question: {question}
Answer in English:";

/// A prompt with `{context}` and `{question}` placeholders.
///
/// ```rust,ignore
/// let template = PromptTemplate::new("Context:\n{context}\n\nQ: {question}\nA:")?;
/// let prompt = template.render("Rust has no GC.", "Does Rust have a GC?");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string() }
    }
}

impl PromptTemplate {
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if either placeholder is missing.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(RagError::ConfigError(format!(
                    "prompt template is missing the {placeholder} placeholder"
                )));
            }
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute both placeholders. Placeholders occurring inside the
    /// substituted values are left as they are.
    pub fn render(&self, context: &str, question: &str) -> String {
        self.template
            .split(QUESTION_PLACEHOLDER)
            .map(|part| part.replace(CONTEXT_PLACEHOLDER, context))
            .collect::<Vec<_>>()
            .join(question)
    }
}

/// Join `texts` with blank lines, keeping at most `budget` characters.
///
/// Texts are taken in order; the one that crosses the budget is cut at a
/// character boundary and nothing after it is kept.
pub fn build_context<'a>(texts: impl IntoIterator<Item = &'a str>, budget: usize) -> String {
    const SEPARATOR: &str = "\n\n";

    let mut context = String::new();
    let mut used = 0;
    for text in texts {
        let separator_len = if context.is_empty() { 0 } else { SEPARATOR.len() };
        if used + separator_len >= budget {
            break;
        }
        if separator_len > 0 {
            context.push_str(SEPARATOR);
            used += separator_len;
        }

        let remaining = budget - used;
        let text_len = text.chars().count();
        if text_len <= remaining {
            context.push_str(text);
            used += text_len;
        } else {
            context.extend(text.chars().take(remaining));
            break;
        }
    }
    context
}
