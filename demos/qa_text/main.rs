//! Question answering over a text or PDF file.
//!
//! Splits the file on sentence boundaries (lines for PDFs), embeds the segments with the
//! OpenAI embeddings API and asks a chat model to answer from the closest
//! segments only.
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! cargo run -p ragkit-demos --example qa_text --features openai -- demos/data/transfer_learning.txt "What is transfer learning"
//! cargo run -p ragkit-demos --example qa_text --features openai,pdf -- paper.pdf "What is the main contribution"
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use ragkit_demos::load_document;
use ragkit_model::{OpenAIConfig, OpenAIGenerator};
use ragkit_rag::{OpenAIEmbedder, PromptTemplate, Query, RagConfig, RagError, RetrievalPipeline};
use tracing::warn;

const PROMPT: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer. \
The answer shouldn't be more than 20 words.

{context}

Question: {question}
Answer in English:";

#[derive(Parser)]
#[command(about = "Answer a question from a text file")]
struct Args {
    /// Text or PDF file to answer from
    #[arg(default_value = "demos/data/transfer_learning.txt")]
    path: PathBuf,

    /// The question
    #[arg(default_value = "What is transfer learning")]
    question: String,

    /// Print the segments the answer was based on
    #[arg(long)]
    sources: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    ragkit_telemetry::init_telemetry("qa_text")?;
    let args = Args::parse();

    let document = load_document(&args.path)?;

    // RAG_* variables override these; PDF text is split on lines
    let separator = if document.metadata.contains_key("pages") { "\n" } else { "." };
    let config = match RagConfig::from_env()? {
        config if config == RagConfig::default() => {
            RagConfig::builder().chunk_size(300).chunk_overlap(0).separator(separator).build()?
        }
        config => config,
    };

    let pipeline = RetrievalPipeline::builder()
        .config(config)
        .embedder(Arc::new(OpenAIEmbedder::from_env()?))
        .generator(Arc::new(OpenAIGenerator::new(OpenAIConfig::from_env()?)?))
        .prompt_template(PromptTemplate::new(PROMPT)?)
        .build()?;

    pipeline.ingest(&document).await?;

    match pipeline.answer(&Query::new(&args.question)).await {
        Ok(answer) => {
            println!("{}", answer.text.trim());
            if args.sources {
                for source in &answer.sources {
                    println!("\n--- score {:.4}\n{}", source.score, source.segment.text.trim());
                }
            }
        }
        Err(RagError::GenerationUnavailable { message, retrieved }) => {
            warn!(%message, "no answer, showing the closest segment instead");
            if let Some(best) = retrieved.first() {
                println!("{}", best.segment.text.trim());
            }
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
