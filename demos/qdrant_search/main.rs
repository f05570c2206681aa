//! Qdrant similarity search example.
//!
//! Stores the segments of a text or PDF file in a Qdrant collection and
//! prints the best match for a query. Embeddings come from the offline
//! hashing embedder. PDF input needs the `pdf` feature.
//!
//! ```bash
//! docker run -p 6334:6334 qdrant/qdrant
//! cargo run -p ragkit-demos --example qdrant_search --features qdrant -- demos/data/transfer_learning.txt "What is transfer learning"
//! cargo run -p ragkit-demos --example qdrant_search --features qdrant,pdf -- report.pdf "In what format should students complete the product"
//! ```
//!
//! `QDRANT_URL` (default `http://localhost:6334`) and `QDRANT_API_KEY` select
//! the server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ragkit_demos::load_document;
use ragkit_rag::{
    DistanceMetric, HashingEmbedder, QdrantIndex, Query, RagConfig, RetrievalPipeline,
};

#[derive(Parser)]
#[command(about = "Similarity search backed by a Qdrant collection")]
struct Args {
    /// Text or PDF file to index
    #[arg(default_value = "demos/data/transfer_learning.txt")]
    path: PathBuf,

    /// Search query
    #[arg(default_value = "What is transfer learning")]
    query: String,

    /// Collection to store the segments in
    #[arg(long, default_value = "my_documents")]
    collection: String,

    /// Embedding dimensions
    #[arg(long, default_value_t = 384)]
    dimensions: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    ragkit_telemetry::init_telemetry("qdrant_search")?;
    let args = Args::parse();

    let document = load_document(&args.path)?;

    let url = std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".to_string());
    let api_key = std::env::var("QDRANT_API_KEY").ok().filter(|k| !k.is_empty());
    let index = QdrantIndex::connect(&url, api_key, &args.collection, args.dimensions, DistanceMetric::Cosine)
        .await
        .with_context(|| format!("failed to open collection '{}' at {url}", args.collection))?;

    let config = RagConfig::builder().chunk_size(300).chunk_overlap(0).separator("\n").build()?;
    let pipeline = RetrievalPipeline::builder()
        .config(config)
        .embedder(Arc::new(HashingEmbedder::new(args.dimensions)?))
        .index(Arc::new(index))
        .build()?;

    pipeline.ingest(&document).await?;

    let hits = pipeline.retrieve(&Query::new(&args.query)).await?;
    match hits.first() {
        Some(best) => {
            println!("{}", best.segment.text.trim());
            println!("\nScore: {:.4}", best.score);
        }
        None => println!("no matching segment"),
    }

    Ok(())
}
