//! Review sentiment example.
//!
//! Classifies every review of a CSV file as positive or negative and prints
//! how the predictions line up with the expected labels.
//!
//! The file needs a header row with `review` and `sentiment` columns; other
//! columns are ignored. A small sample lives in `demos/data/reviews.csv`.
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! cargo run -p ragkit-demos --example review_sentiment --features openai -- demos/data/reviews.csv
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use ragkit_demos::load_reviews;
use ragkit_model::{OpenAIConfig, OpenAIGenerator, SentimentClassifier, SentimentTally};

#[derive(Parser)]
#[command(about = "Classify review sentiment with an OpenAI chat model")]
struct Args {
    /// CSV file of labelled reviews
    #[arg(default_value = "demos/data/reviews.csv")]
    path: PathBuf,

    /// Stop after this many reviews
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    ragkit_telemetry::init_telemetry("review_sentiment")?;
    let args = Args::parse();

    let mut reviews = load_reviews(&args.path)?;
    if let Some(limit) = args.limit {
        reviews.truncate(limit);
    }

    let generator = OpenAIGenerator::new(OpenAIConfig::from_env()?)?;
    let classifier = SentimentClassifier::new(Arc::new(generator));

    let texts: Vec<&str> = reviews.iter().map(|r| r.review.as_str()).collect();
    let predictions = classifier.classify_all(&texts).await?;

    let mut tally = SentimentTally::new();
    for (review, predicted) in reviews.iter().zip(predictions) {
        tally.record(&review.sentiment, predicted);
    }

    println!("{:<10} {:<10} {:>5}", "expected", "predicted", "count");
    for (expected, predicted, count) in tally.iter() {
        println!("{expected:<10} {:<10} {count:>5}", predicted.as_str());
    }
    if let Some(accuracy) = tally.accuracy() {
        println!("\naccuracy: {:.1}% of {}", accuracy * 100.0, tally.total());
    }

    Ok(())
}
