//! Build one consolidated shopping list from recipe URLs, recipe texts and
//! ingredient lists, with a hosted LLM doing the reading and the judgement
//! calls.
//!
//! ```no_run
//! # use grocer::GroceryList;
//! # #[tokio::main]
//! # async fn main() -> Result<(), grocer::GrocerError> {
//! let result = GroceryList::builder()
//!     .url("https://www.kwestiasmaku.com/przepis/kurczak-curry")
//!     .text("Marchew 1kg\nCebula 2 szt.")
//!     .build()
//!     .await?;
//! println!("{}", result.list.to_text());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod input;
pub mod model;
pub mod pipelines;
pub mod prompts;
pub mod providers;
pub mod speech;
pub mod tools;
pub mod units;
pub mod url_to_text;

pub use builder::{GroceryList, LlmProvider, ShoppingListBuilder, ShoppingListResult};
pub use config::AppConfig;
pub use error::GrocerError;
pub use input::{demo_inputs, split_items, InputItem};
pub use model::{ConsolidatedIngredient, Ingredient, ShoppingList, SkippedInput};
pub use pipelines::ShoppingListPipeline;
pub use speech::SpeechSynthesizer;

/// Shopping list for a batch of inputs, using `grocer.toml` and the environment
///
/// # Example
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), grocer::GrocerError> {
/// let list = grocer::shopping_list(&["Marchew 1kg", "Cebula 2 szt."]).await?;
/// println!("{}", list.to_text());
/// # Ok(())
/// # }
/// ```
pub async fn shopping_list<S: AsRef<str>>(inputs: &[S]) -> Result<ShoppingList, GrocerError> {
    let result = GroceryList::builder()
        .inputs(inputs.iter().map(|input| input.as_ref().to_string()))
        .build()
        .await?;
    Ok(result.list)
}

/// Ingredients of a single recipe page, before any consolidation
pub async fn ingredients_from_url(url: &str) -> Result<model::RecipeIngredients, GrocerError> {
    let config = AppConfig::load()?;
    let fetcher = url_to_text::PageFetcher::new(
        &config.fetcher,
        std::time::Duration::from_secs(config.timeout),
    )?;
    let provider = providers::ProviderFactory::from_config(&config).map_err(GrocerError::provider)?;

    let text = fetcher.fetch_recipe_text(url).await?;
    tools::extract_ingredients(provider.as_ref(), &text, &config.language).await
}
