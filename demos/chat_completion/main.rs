//! Chat completion example.
//!
//! Asks an OpenAI chat model to continue a piece of text.
//!
//! Put `OPENAI_API_KEY` in the environment or a `.env` file, then:
//! ```bash
//! cargo run -p ragkit-demos --example chat_completion --features openai -- "I love eating mangoes in"
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use ragkit_model::{OpenAIConfig, OpenAIGenerator, TextCompleter};

#[derive(Parser)]
#[command(about = "Complete a piece of text with an OpenAI chat model")]
struct Args {
    /// Text to complete
    #[arg(default_value = "I love eating mangoes in")]
    text: String,

    /// Print the completion in lowercase
    #[arg(long)]
    lowercase: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    ragkit_telemetry::init_telemetry("chat_completion")?;
    let args = Args::parse();

    let generator = OpenAIGenerator::new(OpenAIConfig::from_env()?)?;
    let completer = TextCompleter::new(Arc::new(generator));

    let completion = completer.complete(&args.text).await?;
    if args.lowercase {
        println!("{}", completion.to_lowercase());
    } else {
        println!("{completion}");
    }

    Ok(())
}
