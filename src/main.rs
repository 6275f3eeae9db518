use clap::Parser;
use env_logger::Env;
use grocer::{demo_inputs, split_items, AppConfig, GroceryList, LlmProvider};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

/// Build one shopping list from recipe URLs, recipe texts and ingredient lists
#[derive(Parser, Debug)]
#[command(name = "grocer", version, about)]
struct Cli {
    /// Recipe URLs, recipe texts or ingredient lists
    inputs: Vec<String>,

    /// Read inputs from a file, one item per block separated by `---` lines
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Add the built-in sample inputs
    #[arg(long)]
    demo: bool,

    /// LLM provider: openai, anthropic, google, azure_openai or ollama
    #[arg(short, long)]
    provider: Option<LlmProvider>,

    /// Model name for the selected provider
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file to use instead of grocer.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Language of the ingredient names
    #[arg(short, long)]
    language: Option<String>,

    /// Also read the list aloud into an mp3 file; `--audio=PATH` picks the file
    #[arg(long, value_name = "PATH", require_equals = true)]
    audio: Option<Option<PathBuf>>,

    /// Print the list as JSON
    #[arg(long)]
    json: bool,

    /// Request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut inputs = cli.inputs;
    if let Some(file) = &cli.file {
        let content = tokio::fs::read_to_string(file).await?;
        inputs.extend(split_items(&content));
    }
    if cli.demo {
        inputs.extend(demo_inputs());
    }
    if inputs.is_empty() {
        return Err("No inputs given. Pass recipe URLs or texts, --file or --demo".into());
    }

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let default_audio_path = PathBuf::from(&config.speech.output_path);

    let mut builder = GroceryList::builder().inputs(inputs).config(config);
    if let Some(provider) = cli.provider {
        builder = builder.provider(provider);
    }
    if let Some(model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(language) = cli.language {
        builder = builder.language(language);
    }
    if let Some(seconds) = cli.timeout {
        builder = builder.timeout(Duration::from_secs(seconds));
    }
    match cli.audio {
        Some(Some(path)) => builder = builder.audio(path),
        Some(None) => builder = builder.audio(default_audio_path),
        None => {}
    }

    let result = builder.build().await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result.list)?);
    } else if result.list.is_empty() {
        println!("The shopping list is empty");
    } else {
        println!("Shopping list:");
        println!("{}", result.list.to_text());
    }

    for skipped in &result.list.skipped {
        eprintln!(
            "Skipped input {} ({}): {}",
            skipped.index + 1,
            skipped.source,
            skipped.reason
        );
    }
    if let Some(path) = result.audio_path {
        info!("Audio saved to {}", path.display());
    }

    Ok(())
}
