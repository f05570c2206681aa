//! Text embeddings example.
//!
//! Chunks a text or PDF file, embeds the chunks and prints the segment closest to a
//! query together with its distance. Uses the offline hashing embedder, so
//! it needs no API key.
//!
//! ```bash
//! cargo run -p ragkit-demos --example text_embeddings -- demos/data/transfer_learning.txt "What is transfer learning?"
//! cargo run -p ragkit-demos --example text_embeddings --features pdf -- brief.pdf "In what format should students complete the product"
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use ragkit_demos::load_document;
use ragkit_rag::{HashingEmbedder, Query, RagConfig, RetrievalPipeline};

#[derive(Parser)]
#[command(about = "Similarity search over a text file")]
struct Args {
    /// Text or PDF file to index
    #[arg(default_value = "demos/data/transfer_learning.txt")]
    path: PathBuf,

    /// Search query
    #[arg(default_value = "What is transfer learning?")]
    query: String,

    /// Maximum segment size in characters
    #[arg(long, default_value_t = 384)]
    chunk_size: usize,

    /// Characters shared by consecutive segments
    #[arg(long, default_value_t = 0)]
    overlap: usize,

    /// Embedding dimensions
    #[arg(long, default_value_t = 384)]
    dimensions: usize,

    /// Number of segments to print
    #[arg(short, long, default_value_t = 1)]
    k: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    ragkit_telemetry::init_telemetry("text_embeddings")?;
    let args = Args::parse();

    let document = load_document(&args.path)?;

    let config = RagConfig::builder().chunk_size(args.chunk_size).chunk_overlap(args.overlap).build()?;
    let pipeline = RetrievalPipeline::builder()
        .config(config)
        .embedder(Arc::new(HashingEmbedder::new(args.dimensions)?))
        .build()?;

    let report = pipeline.ingest(&document).await?;
    println!("indexed {} segments\n", report.segment_count);

    for hit in pipeline.retrieve(&Query::new(&args.query).with_k(args.k)).await? {
        println!("[{}..{}] {}", hit.segment.start, hit.segment.end(), hit.segment.text.trim());
        println!("\nScore: {:.4}\n", hit.score);
    }

    Ok(())
}
