use crate::config::AppConfig;
use crate::consolidate::Consolidator;
use crate::error::GrocerError;
use crate::input::InputItem;
use crate::model::{
    ConsolidatedIngredient, IngredientGroup, RecipeIngredients, ShoppingList, SkippedInput,
};
use crate::providers::{LlmProvider, ProviderFactory};
use crate::tools::{extract_ingredients, group_by_ingredient_name, unify_ingredient_names};
use crate::url_to_text::{fetch_failure_placeholder, PageFetcher};
use log::{error, info, warn};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Turns recipe URLs and texts into one consolidated shopping list.
///
/// Steps run in a fixed order: extract ingredients from every input,
/// unify their names, group by name, consolidate each group. Fetching,
/// extraction and consolidation fan out, bounded by
/// `max_concurrent_requests`.
pub struct ShoppingListPipeline {
    provider: Arc<dyn LlmProvider>,
    fetcher: Arc<PageFetcher>,
    consolidator: Consolidator,
    language: String,
    max_concurrent: usize,
}

impl ShoppingListPipeline {
    pub fn new(config: &AppConfig) -> Result<Self, GrocerError> {
        let provider = ProviderFactory::from_config(config).map_err(GrocerError::provider)?;
        Self::with_provider(provider, config)
    }

    /// Use an already built provider instead of the configured chain
    pub fn with_provider(
        provider: Arc<dyn LlmProvider>,
        config: &AppConfig,
    ) -> Result<Self, GrocerError> {
        let fetcher = PageFetcher::new(&config.fetcher, Duration::from_secs(config.timeout))?;

        Ok(Self {
            consolidator: Consolidator::new(provider.clone(), config.consolidation.clone()),
            provider,
            fetcher: Arc::new(fetcher),
            language: config.language.clone(),
            max_concurrent: config.max_concurrent_requests.max(1),
        })
    }

    pub async fn run(&self, inputs: &[String]) -> Result<ShoppingList, GrocerError> {
        let items: Vec<(usize, InputItem)> = inputs
            .iter()
            .enumerate()
            .filter_map(|(index, raw)| InputItem::classify(raw).map(|item| (index, item)))
            .collect();
        if items.is_empty() {
            return Err(GrocerError::NoInputs);
        }
        info!("Processing {} inputs", items.len());

        let (lists, skipped) = self.extract_all(items).await;
        if lists.is_empty() {
            warn!("No ingredients found in any input");
            return Ok(ShoppingList {
                items: Vec::new(),
                skipped,
            });
        }

        let unified =
            unify_ingredient_names(self.provider.as_ref(), lists.clone(), &self.language).await;
        let lists = match unified {
            Ok(unified) => unified,
            Err(e) => {
                warn!("Could not unify ingredient names, keeping them as extracted: {}", e);
                lists
            }
        };

        let groups = group_by_ingredient_name(&lists);
        info!("Consolidating {} ingredients", groups.len());
        let items = self.consolidate_all(groups).await;

        Ok(ShoppingList { items, skipped })
    }

    /// Extract every input concurrently; results come back in input order
    async fn extract_all(
        &self,
        items: Vec<(usize, InputItem)>,
    ) -> (Vec<RecipeIngredients>, Vec<SkippedInput>) {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (index, item) in items {
            let semaphore = semaphore.clone();
            let provider = self.provider.clone();
            let fetcher = self.fetcher.clone();
            let language = self.language.clone();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let outcome = process_item(provider.as_ref(), &fetcher, &item, &language).await;
                (index, item.source(), outcome)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!("Extraction task failed: {}", e),
            }
        }
        results.sort_by_key(|(index, _, _)| *index);

        let mut lists = Vec::new();
        let mut skipped = Vec::new();
        for (index, source, outcome) in results {
            match outcome {
                Ok(list) => lists.push(list),
                Err(reason) => {
                    warn!("Skipping input {} ({}): {}", index + 1, source, reason);
                    skipped.push(SkippedInput {
                        index,
                        source,
                        reason,
                    });
                }
            }
        }
        (lists, skipped)
    }

    /// Consolidate every group concurrently; a failed group keeps its raw entries
    async fn consolidate_all(&self, groups: Vec<IngredientGroup>) -> Vec<ConsolidatedIngredient> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (index, group) in groups.iter().cloned().enumerate() {
            let semaphore = semaphore.clone();
            let consolidator = self.consolidator.clone();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let outcome = consolidator.consolidate(&group).await;
                (index, outcome)
            });
        }

        let mut items: Vec<Option<ConsolidatedIngredient>> = vec![None; groups.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(item))) => items[index] = Some(item),
                Ok((index, Err(e))) => {
                    warn!("Could not consolidate {}: {}", groups[index].name, e)
                }
                Err(e) => error!("Consolidation task failed: {}", e),
            }
        }

        items
            .into_iter()
            .zip(&groups)
            .map(|(item, group)| item.unwrap_or_else(|| ConsolidatedIngredient::unresolved(group)))
            .collect()
    }
}

/// Fetch when needed, then extract; failures become the skip reason
async fn process_item(
    provider: &dyn LlmProvider,
    fetcher: &PageFetcher,
    item: &InputItem,
    language: &str,
) -> Result<RecipeIngredients, String> {
    let text: Cow<'_, str> = match item {
        InputItem::Url(url) => match fetcher.fetch_recipe_text(url).await {
            Ok(text) => Cow::Owned(text),
            Err(e) => return Err(fetch_failure_placeholder(url, &e)),
        },
        InputItem::Text(text) => Cow::Borrowed(text),
    };

    let list = extract_ingredients(provider, &text, language)
        .await
        .map_err(|e| e.to_string())?;
    if list.ingredients.is_empty() {
        return Err("No ingredients found".to_string());
    }
    Ok(list)
}
